use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::OutlineError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name used in logs (e.g. "openai_compat")
    fn name(&self) -> &str;

    /// check if the provider is reachable
    async fn health_check(&self) -> Result<bool, OutlineError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, OutlineError>;
}
