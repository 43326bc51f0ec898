use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Sends a prompt to a text-generation service.
///
/// Implementations hide whether the service streams its answer; callers get
/// the fully assembled text. An empty `Ok` means the model produced nothing,
/// which is distinct from the service being unreachable.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, prompt: &str) -> Result<String, LLMError>;
}
