use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

static TOOL_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<tool_call>\s*(.*?)\s*</tool_call>")
        .expect("BUG: invalid tool_call regex literal")
});

/// First `<tool_call>` payload in `text`, if it parses as `{name, arguments}`.
pub fn extract_tool_call(text: &str) -> Option<ToolCall> {
    let payload = TOOL_CALL_RE.captures(text)?.get(1)?.as_str();
    match serde_json::from_str(payload) {
        Ok(call) => Some(call),
        Err(e) => {
            tracing::debug!("Ignoring unparsable tool call payload: {}", e);
            None
        }
    }
}
