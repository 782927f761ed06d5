use std::sync::Arc;

use thiserror::Error;
use tintquote_core::domain::quote::{CustomerQuoteRequest, QuoteOutcome};
use tracing::{debug, info};

use crate::llm::{LlmClient, LlmError};

const BUSINESS_DESCRIPTION: &str = "We are a mobile window tinting business. We install \
premium ceramic and carbon window film on cars, SUVs and trucks at the customer's location, \
and we remove old or damaged tint before installing new film when requested.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("model reply `{raw}` is not a price")]
    UnparseableEstimate { raw: String },
}

/// Prices a customer booking by asking a language model.
///
/// Building jobs short-circuit to [`QuoteOutcome::ManualFollowUp`] without
/// contacting the model.
#[derive(Clone)]
pub struct QuoteEstimator {
    client: Arc<dyn LlmClient>,
}

impl QuoteEstimator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn estimate(
        &self,
        request: &CustomerQuoteRequest,
    ) -> Result<QuoteOutcome, EstimateError> {
        if request.is_building() {
            info!(
                event_name = "quote.estimate.manual_follow_up",
                booking_type = %request.booking_type,
                "building booking requires manual follow-up"
            );
            return Ok(QuoteOutcome::ManualFollowUp);
        }

        let prompt = build_prompt(request);
        debug!(event_name = "quote.estimate.prompt", prompt_len = prompt.len(), "sending prompt");

        let reply = self.client.complete(&prompt).await?;
        let cleaned = clean_reply(&reply);

        QuoteOutcome::parse(&cleaned)
            .map_err(|_| EstimateError::UnparseableEstimate { raw: reply.trim().to_string() })
    }
}

pub fn build_prompt(request: &CustomerQuoteRequest) -> String {
    let removal = if request.old_tint_removal { "yes" } else { "no" };
    format!(
        "{BUSINESS_DESCRIPTION}\n\n\
         A customer has requested a window tinting quote.\n\
         Customer name: {first} {last}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Booking type: {booking}\n\
         Tint selection: {tint}\n\
         Vehicle: {vehicle}\n\
         Remove old tint: {removal}\n\n\
         Reply with the total price in US dollars as a single number, with no other text.",
        first = request.first_name,
        last = request.last_name,
        email = request.email,
        phone = request.phone,
        booking = request.booking_type,
        tint = request.tint_selection,
        vehicle = request.vehicle,
    )
}

/// Trims whitespace and removes every `$` from a model reply.
pub fn clean_reply(reply: &str) -> String {
    reply.trim().replace('$', "")
}
