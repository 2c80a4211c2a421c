use std::sync::Arc;

use async_trait::async_trait;

use super::json::extract_json_object;
use super::prompt::build_extraction_prompt;
use crate::core::config::LlmSettings;
use crate::core::errors::OutlineError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::outline::types::{OutlineDocument, OutlineFragment};

/// Turns one chunk of text into an outline fragment, given what has been
/// extracted so far.
#[async_trait]
pub trait StructureExtractor: Send + Sync {
    async fn extract(
        &self,
        previous: Option<&OutlineDocument>,
        chunk: &str,
    ) -> Result<OutlineFragment, OutlineError>;
}

#[async_trait]
impl<T: StructureExtractor + ?Sized> StructureExtractor for Arc<T> {
    async fn extract(
        &self,
        previous: Option<&OutlineDocument>,
        chunk: &str,
    ) -> Result<OutlineFragment, OutlineError> {
        (**self).extract(previous, chunk).await
    }
}

pub struct LlmStructureExtractor<P: LlmProvider> {
    provider: P,
    model: String,
    temperature: f64,
}

impl<P: LlmProvider> LlmStructureExtractor<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn from_settings(provider: P, settings: &LlmSettings) -> Self {
        Self::new(provider, settings.model.clone()).with_temperature(settings.temperature)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl<P: LlmProvider> StructureExtractor for LlmStructureExtractor<P> {
    async fn extract(
        &self,
        previous: Option<&OutlineDocument>,
        chunk: &str,
    ) -> Result<OutlineFragment, OutlineError> {
        let prompt = build_extraction_prompt(previous, chunk)?;
        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(self.temperature);

        let reply = self.provider.chat(request, &self.model).await?;
        tracing::debug!(
            provider = self.provider.name(),
            reply_chars = reply.chars().count(),
            "structure reply received"
        );

        let value = extract_json_object(reply.trim())?;
        OutlineFragment::from_value(&value)
    }
}
