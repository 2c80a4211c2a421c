use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("line {line} has {tokens} tokens, exceeding the chunk limit of {max_tokens}")]
    LineTooLarge {
        /// 1-based index into the non-empty line sequence.
        line: usize,
        tokens: usize,
        max_tokens: usize,
    },
    #[error("malformed outline at '{path}': {reason}")]
    MalformedStructure { path: String, reason: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("json extraction failed: {0}")]
    JsonExtraction(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl OutlineError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        OutlineError::Internal(err.to_string())
    }

    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        OutlineError::Provider(err.to_string())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutlineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        OutlineError::MalformedStructure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
