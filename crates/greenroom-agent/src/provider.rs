use async_trait::async_trait;

/// Common interface for LLM text providers.
///
/// The engine never talks HTTP itself; the caller supplies an
/// implementation (Gemini, Anthropic, a test double) and the engine only
/// sees this trait.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send one prompt, wait for the full text response.
    ///
    /// `workflow` tags the call for the provider's own bookkeeping
    /// (e.g. "profile_classification").
    async fn create_message(
        &self,
        prompt: &str,
        model: &str,
        workflow: &str,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("operation cancelled")]
    Cancelled,
}
