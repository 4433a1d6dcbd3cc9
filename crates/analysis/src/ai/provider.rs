use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl AiError {
    /// Transient errors are worth retrying with backoff; everything else is
    /// terminal for the call.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Network(_) | Self::Timeout(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct AiRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct AiResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Capability interface for the external reasoning service. The pipeline has
/// zero dependency on a concrete provider; anything that can answer an
/// `AiRequest` with structured text slots in here.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn analyze(&self, request: AiRequest) -> Result<AiResponse, AiError>;

    fn model_name(&self) -> &str;

    fn max_context_tokens(&self) -> usize;

    fn estimate_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }
}
