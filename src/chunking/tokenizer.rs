//! Token counting backends for the chunker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokenizers::Tokenizer;

use crate::core::errors::OutlineError;

/// Counts tokens in a piece of text. Must be deterministic.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> usize {
        self(text)
    }
}

/// One token per Unicode scalar value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// One token per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Subword token counts from a HuggingFace `tokenizer.json`.
///
/// Text the tokenizer cannot encode is counted one token per character
/// instead. The first such failure is logged at `warn`; [`degraded`]
/// reports whether it has happened.
///
/// [`degraded`]: HfTokenCounter::degraded
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
    degraded: AtomicBool,
}

impl HfTokenCounter {
    /// Load from a `tokenizer.json` file or a directory that contains one.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutlineError> {
        let file = resolve_tokenizer_file(path.as_ref());
        if !file.exists() {
            return Err(OutlineError::Tokenizer(format!(
                "tokenizer file not found: {}",
                file.display()
            )));
        }

        let tokenizer = Tokenizer::from_file(&file).map_err(|e| {
            OutlineError::Tokenizer(format!("failed to load {}: {}", file.display(), e))
        })?;
        tracing::info!("Loaded tokenizer from {}", file.display());
        Ok(Self {
            tokenizer,
            degraded: AtomicBool::new(false),
        })
    }

    /// Whether any count so far fell back to characters.
    pub fn degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}

impl TokenCounter for HfTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    tracing::warn!(
                        "Tokenizer failed, counting characters for unencodable text: {}",
                        e
                    );
                }
                text.chars().count()
            }
        }
    }
}

fn resolve_tokenizer_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("tokenizer.json")
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_counter_counts_scalars_not_bytes() {
        assert_eq!(CharCounter.count_tokens("组件类"), 3);
        assert_eq!(CharCounter.count_tokens(""), 0);
    }

    #[test]
    fn whitespace_counter_splits_on_any_whitespace() {
        assert_eq!(WhitespaceCounter.count_tokens("one two\nthree\t four"), 4);
        assert_eq!(WhitespaceCounter.count_tokens("   "), 0);
    }

    #[test]
    fn closures_are_token_counters() {
        let lines = |text: &str| text.lines().count();
        assert_eq!(lines.count_tokens("a\nb\nc"), 3);
    }

    #[test]
    fn missing_tokenizer_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = HfTokenCounter::from_path(tmp.path()).err().unwrap();
        assert!(matches!(err, OutlineError::Tokenizer(_)));
        assert!(err.to_string().contains("tokenizer.json"));
    }

    const WORD_LEVEL_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "hello": 0, "world": 1 },
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn unencodable_text_falls_back_to_chars_and_marks_the_counter() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tokenizer.json"), WORD_LEVEL_TOKENIZER).unwrap();
        let counter = HfTokenCounter::from_path(tmp.path()).unwrap();

        assert_eq!(counter.count_tokens("hello world"), 2);
        assert!(!counter.degraded());

        assert_eq!(counter.count_tokens("hello there"), 11);
        assert!(counter.degraded());
        assert_eq!(counter.count_tokens("there"), 5);
        assert!(counter.degraded());
    }
}
