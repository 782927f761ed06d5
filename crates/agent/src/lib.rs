//! Model-delegated quoting.
//!
//! This crate turns a customer booking into a price by prompting a
//! chat-completions model:
//! - `llm` holds the `LlmClient` trait and an OpenAI-compatible HTTP client
//! - `estimator` builds the prompt, short-circuits building jobs to a manual
//!   follow-up, and parses the model reply into a `QuoteOutcome`
//!
//! A reply that is not a number is reported as
//! `EstimateError::UnparseableEstimate`; it is never passed on as a price.

pub mod estimator;
pub mod llm;

pub use estimator::{EstimateError, QuoteEstimator};
pub use llm::{ChatCompletionsClient, LlmClient, LlmError};
