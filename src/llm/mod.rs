//! Answer generation.
//!
//! Generation is the one stage that is allowed to fail without failing the
//! request: network and API problems are absorbed into a fixed fallback
//! answer (`Generation::Degraded`), while misuse of the generator itself is
//! a real error that surfaces as a request failure.

mod hosted;
mod prompt;

pub use hosted::HostedGenerator;
pub use prompt::build_prompt;

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Substituted whenever the generator cannot produce a grounded answer.
pub const GENERATION_FALLBACK: &str = "I'm sorry, I don't see that information in the portal.";

/// Outcome of a generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// The model produced an answer.
    Answered(String),
    /// Generation could not run or failed; `fallback` is what the user sees.
    Degraded { fallback: String, cause: String },
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer from retrieved context snippets.
    ///
    /// Network, HTTP, and missing-credential conditions come back as
    /// `Ok(Generation::Degraded)`. `Err` is reserved for invalid invocation
    /// (e.g. an empty snippet list) and fails the whole request.
    async fn generate(&self, snippets: &[String], question: &str) -> Result<Generation, ApiError>;
}
