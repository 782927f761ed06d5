pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use domain::invoice::{
    amount_to_cents, checked_invoice_url, InvoiceDraft, InvoiceLineItem, LINE_ITEM_NAME,
};
pub use domain::quote::{
    CustomerQuoteRequest, QuoteOutcome, VehicleQuoteRequest, MANUAL_FOLLOW_UP_MARKER,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{PricingEngine, PricingResult, RuleTable, RuleTablePricingEngine};
