//! Client for the Insight API, a search-grounded generative AI service.
//!
//! The service answers free-text prompts and can consult live web search
//! results while doing so. Callers that need machine-readable answers ask
//! for strict JSON in the prompt; replies are still untrusted free text,
//! so parsing happens at the call site.

mod client;
mod mock;
mod util;

use async_trait::async_trait;
use thiserror::Error;

pub use client::InsightClient;
pub use mock::MockInsight;
pub use util::strip_code_blocks;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Insight request timed out")]
    Timeout,

    #[error("Insight transport error: {0}")]
    Transport(String),

    #[error("Insight API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Insight returned an empty response")]
    EmptyResponse,
}

impl InsightError {
    /// Transient errors are worth retrying on a later request;
    /// the caller must not cache anything derived from them.
    pub fn is_transient(&self) -> bool {
        matches!(self, InsightError::Timeout | InsightError::Transport(_))
    }
}

/// A prompt-in, text-out transport to the Insight service.
///
/// The engine depends on this trait rather than the concrete client so
/// tests and the offline mock mode can substitute canned responses.
#[async_trait]
pub trait InsightTransport: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, InsightError>;
}
