use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::LlmSettings;
use crate::core::errors::OutlineError;

/// Client for any OpenAI-compatible `/chat/completions` endpoint
/// (DeepSeek, vLLM, DashScope, LM Studio, ...).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OutlineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OutlineError::provider)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, OutlineError> {
        Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

pub(crate) fn build_chat_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.top_p { obj.insert("top_p".to_string(), json!(t)); }
        if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        if let Some(s) = &request.stop { obj.insert("stop".to_string(), json!(s)); }
    }

    body
}

pub(crate) fn parse_chat_content(payload: &Value) -> Result<String, OutlineError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| {
            OutlineError::Provider(format!(
                "response has no choices[0].message.content: {}",
                payload
            ))
        })
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn health_check(&self) -> Result<bool, OutlineError> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, OutlineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_chat_body(&request, model_id);

        tracing::debug!(
            "POST {} (model={}, messages={})",
            url,
            model_id,
            request.messages.len()
        );

        let res = self
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(OutlineError::provider)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(OutlineError::Provider(format!(
                "chat completion failed with {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(OutlineError::provider)?;
        parse_chat_content(&payload)
    }
}
