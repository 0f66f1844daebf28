use async_trait::async_trait;

/// Single-turn text completion. Implementations must not carry conversation
/// history from one call to the next.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        message: &str,
    ) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("configuration: {0}")]
    Configuration(String),
}

impl LlmClientError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmClientError::RateLimited)
    }
}
