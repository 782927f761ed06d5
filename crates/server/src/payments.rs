use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tintquote_core::config::PaymentsConfig;
use tintquote_core::domain::invoice::InvoiceDraft;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentsError {
    #[error("payments client could not be built: {0}")]
    Client(String),
    #[error("payments request failed: {0}")]
    Transport(String),
    #[error("payments provider rejected the invoice with status {status}: {body}")]
    Rejected { status: u16, body: Value },
    #[error("payments response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    /// Creates an invoice and returns the provider's JSON verbatim.
    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Value, PaymentsError>;
}

#[derive(Clone, Debug)]
pub struct HttpInvoiceGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl HttpInvoiceGateway {
    pub fn new(
        base_url: &str,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, PaymentsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| PaymentsError::Client(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v2/invoices", base_url.trim_end_matches('/')),
            access_token,
        })
    }

    pub fn from_config(config: &PaymentsConfig) -> Result<Self, PaymentsError> {
        Self::new(
            &config.base_url,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl InvoiceGateway for HttpInvoiceGateway {
    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Value, PaymentsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.access_token.expose_secret())
            .json(&invoice_payload(draft))
            .send()
            .await
            .map_err(|error| PaymentsError::Transport(error.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|error| PaymentsError::Decode(error.to_string()))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(PaymentsError::Rejected { status: status.as_u16(), body });
        }
        if !body.is_object() {
            return Err(PaymentsError::Decode(format!("expected a JSON object, got {body}")));
        }

        Ok(body)
    }
}

pub fn invoice_payload(draft: &InvoiceDraft) -> Value {
    let line_items: Vec<Value> = draft
        .line_items
        .iter()
        .map(|line| {
            json!({
                "name": line.name,
                "quantity": line.quantity.to_string(),
                "base_price_money": {
                    "amount": line.amount_cents,
                    "currency": draft.currency,
                },
            })
        })
        .collect();

    json!({
        "invoice": {
            "location_id": draft.location_id,
            "primary_recipient": { "email_address": draft.recipient_email },
            "delivery_method": "EMAIL",
            "line_items": line_items,
        }
    })
}
