use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::DomainError;

/// Wire value of [`QuoteOutcome::ManualFollowUp`].
pub const MANUAL_FOLLOW_UP_MARKER: &str = "MANUAL_FOLLOW_UP";

/// Request shape for the rule-table calculator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleQuoteRequest {
    #[serde(deserialize_with = "text_or_number")]
    pub vehicle_year: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub tint_package: String,
    pub extras: Vec<String>,
}

/// Request shape for the model-delegated calculator. Field names are the
/// literal labels of the booking form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerQuoteRequest {
    #[serde(rename = "Whats Your Name First Name")]
    pub first_name: String,
    #[serde(rename = "Whats Your Name Last Name")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone", deserialize_with = "text_or_number")]
    pub phone: String,
    #[serde(rename = "Booking Type")]
    pub booking_type: String,
    #[serde(rename = "Tint Selection")]
    pub tint_selection: String,
    #[serde(rename = "Vehicle Year Make Model")]
    pub vehicle: String,
    #[serde(rename = "Old Tint Removal", deserialize_with = "flag_or_text")]
    pub old_tint_removal: bool,
}

impl CustomerQuoteRequest {
    /// Building jobs are never priced automatically.
    pub fn is_building(&self) -> bool {
        self.booking_type.trim().eq_ignore_ascii_case("building")
    }
}

/// Result of a quote calculation: either a price or a request for a human to
/// follow up with the customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuoteOutcome {
    Price(Decimal),
    ManualFollowUp,
}

impl QuoteOutcome {
    /// Parses a free-text amount. Surrounding whitespace, `$` signs and digit
    /// separators (`,` and `_`) are ignored; the marker is matched
    /// case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(MANUAL_FOLLOW_UP_MARKER) {
            return Ok(Self::ManualFollowUp);
        }

        let cleaned: String =
            trimmed.chars().filter(|ch| !matches!(ch, '$' | ',' | '_')).collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(DomainError::InvalidAmount(raw.to_string()));
        }

        let price = Decimal::from_str(cleaned)
            .or_else(|_| Decimal::from_scientific(cleaned))
            .map_err(|_| DomainError::InvalidAmount(raw.to_string()))?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(DomainError::NegativeAmount(price));
        }

        Ok(Self::Price(price))
    }

    /// Accepts a JSON number, a numeric string or the marker string.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        match value {
            Value::String(text) => Self::parse(text),
            Value::Number(number) => Self::parse(&number.to_string()),
            other => Err(DomainError::InvalidAmount(other.to_string())),
        }
    }

    /// True when a raw JSON value is the marker string, in any case.
    pub fn is_marker(value: &Value) -> bool {
        value
            .as_str()
            .is_some_and(|text| text.trim().eq_ignore_ascii_case(MANUAL_FOLLOW_UP_MARKER))
    }

    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Price(price) => Some(*price),
            Self::ManualFollowUp => None,
        }
    }
}

impl fmt::Display for QuoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price(price) => write!(f, "{}", price.normalize()),
            Self::ManualFollowUp => f.write_str(MANUAL_FOLLOW_UP_MARKER),
        }
    }
}

impl Serialize for QuoteOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::ManualFollowUp => serializer.serialize_str(MANUAL_FOLLOW_UP_MARKER),
            Self::Price(price) => {
                let normalized = price.normalize();
                if normalized.scale() == 0 {
                    if let Some(whole) = normalized.to_i64() {
                        return serializer.serialize_i64(whole);
                    }
                }
                match normalized.to_f64() {
                    Some(value) => serializer.serialize_f64(value),
                    None => serializer.serialize_str(&normalized.to_string()),
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for QuoteOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!("expected text or number, got {other}"))),
    }
}

fn flag_or_text<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::Null => Ok(false),
        Value::String(text) => {
            let normalized = text.trim().to_ascii_lowercase();
            Ok(matches!(normalized.as_str(), "yes" | "y" | "true" | "1" | "on"))
        }
        other => Err(serde::de::Error::custom(format!("expected yes/no flag, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{CustomerQuoteRequest, QuoteOutcome, VehicleQuoteRequest, MANUAL_FOLLOW_UP_MARKER};
    use crate::errors::DomainError;

    #[test]
    fn parse_strips_dollar_signs_and_whitespace() {
        let outcome = QuoteOutcome::parse("  $425.50\n").expect("price");
        assert_eq!(outcome, QuoteOutcome::Price(Decimal::new(42550, 2)));
    }

    #[test]
    fn parse_recognizes_marker_in_any_case() {
        assert_eq!(QuoteOutcome::parse("manual_follow_up"), Ok(QuoteOutcome::ManualFollowUp));
        assert_eq!(QuoteOutcome::parse(MANUAL_FOLLOW_UP_MARKER), Ok(QuoteOutcome::ManualFollowUp));
    }

    #[test]
    fn parse_rejects_free_text_and_negative_amounts() {
        assert!(matches!(
            QuoteOutcome::parse("around four hundred"),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(QuoteOutcome::parse("$"), Err(DomainError::InvalidAmount(_))));
        assert!(matches!(QuoteOutcome::parse("-20"), Err(DomainError::NegativeAmount(_))));
    }

    #[test]
    fn parse_ignores_digit_separators() {
        assert_eq!(QuoteOutcome::parse("$1,200"), Ok(QuoteOutcome::Price(Decimal::new(1200, 0))));
        assert_eq!(
            QuoteOutcome::parse("12_500.75"),
            Ok(QuoteOutcome::Price(Decimal::new(1_250_075, 2)))
        );
    }

    #[test]
    fn marker_detection_only_matches_marker_strings() {
        assert!(QuoteOutcome::is_marker(&json!(" manual_follow_up ")));
        assert!(!QuoteOutcome::is_marker(&json!("$1,200")));
        assert!(!QuoteOutcome::is_marker(&json!(400)));
    }

    #[test]
    fn integral_prices_serialize_as_json_integers() {
        let value = serde_json::to_value(QuoteOutcome::Price(Decimal::new(40000, 2))).expect("json");
        assert_eq!(value, json!(400));

        let value = serde_json::to_value(QuoteOutcome::Price(Decimal::new(41250, 2))).expect("json");
        assert_eq!(value, json!(412.5));

        let value = serde_json::to_value(QuoteOutcome::ManualFollowUp).expect("json");
        assert_eq!(value, json!("MANUAL_FOLLOW_UP"));
    }

    #[test]
    fn outcome_deserializes_from_numbers_and_strings() {
        let from_number: QuoteOutcome = serde_json::from_value(json!(525)).expect("number");
        let from_text: QuoteOutcome = serde_json::from_value(json!("$525")).expect("text");
        assert_eq!(from_number, from_text);

        let rejected = serde_json::from_value::<QuoteOutcome>(json!(["525"]));
        assert!(rejected.is_err());
    }

    #[test]
    fn vehicle_request_accepts_numeric_year() {
        let request: VehicleQuoteRequest = serde_json::from_value(json!({
            "vehicle_year": 2021,
            "vehicle_make": "Chevrolet",
            "vehicle_model": "Tahoe SUV",
            "tint_package": "Full",
            "extras": ["Ceramic Tint"]
        }))
        .expect("request");

        assert_eq!(request.vehicle_year, "2021");
    }

    #[test]
    fn customer_request_reads_form_field_names() {
        let request: CustomerQuoteRequest = serde_json::from_value(json!({
            "Whats Your Name First Name": "Dana",
            "Whats Your Name Last Name": "Reyes",
            "Email": "dana@example.com",
            "Phone": 5551234567_u64,
            "Booking Type": " BUILDING ",
            "Tint Selection": "Storefront",
            "Vehicle Year Make Model": "",
            "Old Tint Removal": "Yes"
        }))
        .expect("request");

        assert_eq!(request.phone, "5551234567");
        assert!(request.old_tint_removal);
        assert!(request.is_building());
    }

    #[test]
    fn missing_form_field_is_rejected() {
        let result = serde_json::from_value::<CustomerQuoteRequest>(json!({
            "Whats Your Name First Name": "Dana"
        }));
        assert!(result.is_err());
    }
}
