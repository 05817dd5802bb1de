#[cfg(feature = "openrouter")]
pub mod openrouter;

use async_trait::async_trait;

use crate::{error::GenerationError, models::ReportReference};

#[cfg(feature = "openrouter")]
pub use openrouter::OpenRouterBackend;

/// One prompt for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// System instructions for the model
    pub preamble: String,
    pub prompt: String,
    /// Document sent alongside the prompt
    pub attachment: Option<ReportReference>,
}

impl GenerationRequest {
    pub fn new(preamble: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            prompt: prompt.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<ReportReference>) -> Self {
        self.attachment = attachment;
        self
    }
}

/// The external model service. Implementations return the raw reply text;
/// schema enforcement happens in the callers.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
