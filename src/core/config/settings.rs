//! Typed view over the merged YAML configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::OutlineError;

pub const DEFAULT_MAX_TOKENS: usize = 2048;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub llm: LlmSettings,
    pub validation: ValidationSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_tokens: usize,
    /// `tokenizer.json`, or a directory containing one. Falls back to a
    /// character counter when unset.
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            tokenizer_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: None,
            timeout_secs: 120,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub threshold: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub skip_failed_chunks: bool,
    pub progress_file: PathBuf,
    pub output_file: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            skip_failed_chunks: true,
            progress_file: PathBuf::from("merged_progress.json"),
            output_file: PathBuf::from("final_merged_markdown_structure.json"),
        }
    }
}

impl Settings {
    pub fn from_value(config: &Value) -> Result<Self, OutlineError> {
        serde_json::from_value(config.clone())
            .map_err(|e| OutlineError::Config(format!("Failed to read settings: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings = Settings::from_value(&json!({ "llm": { "model": "qwen" } })).unwrap();

        assert_eq!(settings.llm.model, "qwen");
        assert_eq!(settings.llm.base_url, "https://api.deepseek.com");
        assert_eq!(settings.chunking.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(settings.validation.threshold, DEFAULT_MATCH_THRESHOLD);
        assert!(settings.pipeline.skip_failed_chunks);
    }

    #[test]
    fn tokenizer_path_is_read_as_path() {
        let settings =
            Settings::from_value(&json!({ "chunking": { "tokenizer_path": "./tokenizer" } }))
                .unwrap();
        assert_eq!(
            settings.chunking.tokenizer_path,
            Some(PathBuf::from("./tokenizer"))
        );
    }
}
