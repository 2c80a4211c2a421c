use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tool_call::extract_tool_call;
use crate::core::errors::OutlineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    FunctionCall,
    Observation,
    #[serde(alias = "assistant")]
    Gpt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub from: Role,
    pub value: String,
    /// Free text that accompanied a function call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Turn {
    pub fn new(from: Role, value: impl Into<String>) -> Self {
        Self {
            from,
            value: value.into(),
            content: None,
        }
    }
}

/// A tool-using dialogue in the sharegpt-like `{from, value}` layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub system_prompt: String,
    /// Tool signatures, rendered verbatim inside `<tools>`
    #[serde(default)]
    pub tools: String,
    #[serde(default)]
    pub conversations: Vec<Turn>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, tools: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tools: tools.into(),
            conversations: Vec::new(),
        }
    }

    pub fn add_human(&mut self, value: impl Into<String>) -> &mut Self {
        self.conversations.push(Turn::new(Role::Human, value));
        self
    }

    pub fn add_gpt(&mut self, value: impl Into<String>) -> &mut Self {
        self.conversations.push(Turn::new(Role::Gpt, value));
        self
    }

    /// Tool results are stored as their JSON text.
    pub fn add_observation(&mut self, value: &Value) -> Result<&mut Self, OutlineError> {
        let text = serde_json::to_string(value).map_err(OutlineError::internal)?;
        self.conversations.push(Turn::new(Role::Observation, text));
        Ok(self)
    }

    pub fn add_function_call(
        &mut self,
        call: impl Into<String>,
        content: Option<String>,
    ) -> &mut Self {
        self.conversations.push(Turn {
            from: Role::FunctionCall,
            value: call.into(),
            content: content.filter(|c| !c.is_empty()),
        });
        self
    }

    /// Record a raw model reply, as a function call when it carries a
    /// `<tool_call>` block and as a plain answer otherwise.
    pub fn push_model_reply(&mut self, reply: &str) -> Result<&mut Self, OutlineError> {
        match extract_tool_call(reply) {
            Some(call) => {
                let value = serde_json::to_string(&call).map_err(OutlineError::internal)?;
                Ok(self.add_function_call(value, Some(reply.to_string())))
            }
            None => Ok(self.add_gpt(reply)),
        }
    }

    pub fn last(&self) -> Option<&Turn> {
        self.conversations.last()
    }

    pub fn export(&self) -> Result<Value, OutlineError> {
        serde_json::to_value(self).map_err(OutlineError::internal)
    }
}
