use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Name of the single billable line on every invoice.
pub const LINE_ITEM_NAME: &str = "Premium Ceramic Window Tinting";

/// Converts a price into integer minor units, rounding half away from zero.
///
/// The arithmetic is exact decimal, not binary float, so `100.005` becomes
/// `10001` cents where a float multiply would give `10000`.
pub fn amount_to_cents(amount: Decimal) -> Result<i64, DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::NegativeAmount(amount));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| DomainError::InvalidAmount(amount.to_string()))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| DomainError::InvalidAmount(amount.to_string()))
}

/// Validates a caller-supplied payment link before it is placed in an email.
pub fn checked_invoice_url(raw: &str) -> Result<&str, DomainError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(DomainError::MissingInvoiceUrl);
    }

    let has_scheme = url.starts_with("https://") || url.starts_with("http://");
    let breaks_attribute =
        url.chars().any(|ch| ch.is_whitespace() || matches!(ch, '"' | '\'' | '<' | '>'));
    if !has_scheme || breaks_attribute {
        return Err(DomainError::InvalidInvoiceUrl(url.to_string()));
    }

    Ok(url)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub name: String,
    pub quantity: u32,
    pub amount_cents: i64,
}

/// Everything the payments provider needs to create one invoice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub recipient_email: String,
    pub currency: String,
    pub location_id: String,
    pub line_items: Vec<InvoiceLineItem>,
}

impl InvoiceDraft {
    pub fn for_tinting(
        recipient_email: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let recipient_email = recipient_email.into();
        if !recipient_email.contains('@') {
            return Err(DomainError::InvalidRecipient(recipient_email));
        }

        Ok(Self {
            recipient_email,
            currency: currency.into(),
            location_id: location_id.into(),
            line_items: vec![InvoiceLineItem {
                name: LINE_ITEM_NAME.to_string(),
                quantity: 1,
                amount_cents: amount_to_cents(amount)?,
            }],
        })
    }

    pub fn total_cents(&self) -> i64 {
        self.line_items.iter().map(|line| line.amount_cents * i64::from(line.quantity)).sum()
    }
}
