pub mod invoice;
pub mod quote;
