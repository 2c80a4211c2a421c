//! Token-bounded greedy line chunking.
//!
//! Lines are appended to the current chunk one at a time. Before a line is
//! accepted, the token count of the chunk joined with the candidate line is
//! checked against the budget; if it would overflow, the current chunk is
//! closed and the candidate starts a new one. A line is never split, so a
//! single line over budget aborts chunking with `LineTooLarge`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::document::read_non_empty_lines;
use super::tokenizer::TokenCounter;
use crate::core::config::settings::DEFAULT_MAX_TOKENS;
use crate::core::errors::OutlineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Upper bound on tokens per chunk (inclusive).
    pub max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// A contiguous run of source lines joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position in the chunk sequence
    pub index: usize,
    /// 1-based index of the first line in the non-empty line sequence
    pub first_line: usize,
    /// 1-based index of the last line (inclusive)
    pub last_line: usize,
    /// Token count of `text` as reported by the counter
    pub tokens: usize,
    pub text: String,
}

impl Chunk {
    pub fn line_count(&self) -> usize {
        self.last_line + 1 - self.first_line
    }
}

pub struct Chunker<C> {
    config: ChunkerConfig,
    counter: C,
}

impl<C: TokenCounter> Chunker<C> {
    pub fn new(config: ChunkerConfig, counter: C) -> Self {
        Self { config, counter }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Split already-cleaned lines into chunks.
    pub fn split<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Chunk>, OutlineError> {
        split_lines(lines, self.config.max_tokens, &self.counter)
    }

    /// Read a markdown file, drop blank lines, and chunk the rest.
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>, OutlineError> {
        let path = path.as_ref();
        let lines = read_non_empty_lines(path)?;
        let chunks = self.split(&lines)?;
        tracing::info!(
            "Split {} into {} chunks ({} lines, <= {} tokens each)",
            path.display(),
            chunks.len(),
            lines.len(),
            self.config.max_tokens
        );
        Ok(chunks)
    }
}

/// Chunk texts only; see [`split_lines`] for the positional variant.
pub fn chunk_lines<S, C>(
    lines: &[S],
    max_tokens: usize,
    counter: &C,
) -> Result<Vec<String>, OutlineError>
where
    S: AsRef<str>,
    C: TokenCounter + ?Sized,
{
    Ok(split_lines(lines, max_tokens, counter)?
        .into_iter()
        .map(|chunk| chunk.text)
        .collect())
}

pub fn split_lines<S, C>(
    lines: &[S],
    max_tokens: usize,
    counter: &C,
) -> Result<Vec<Chunk>, OutlineError>
where
    S: AsRef<str>,
    C: TokenCounter + ?Sized,
{
    if max_tokens == 0 {
        return Err(OutlineError::InvalidArgument(
            "max_tokens must be positive".to_string(),
        ));
    }

    let mut chunks = Vec::new();
    let mut current = OpenChunk::default();

    for (offset, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let line_number = offset + 1;

        let line_tokens = counter.count_tokens(line);
        if line_tokens > max_tokens {
            return Err(OutlineError::LineTooLarge {
                line: line_number,
                tokens: line_tokens,
                max_tokens,
            });
        }

        if current.is_empty() {
            current.start(line, line_number, line_tokens);
            continue;
        }

        let candidate = format!("{}\n{}", current.text, line);
        let candidate_tokens = counter.count_tokens(&candidate);
        if candidate_tokens > max_tokens {
            let closed = current.close(chunks.len());
            tracing::debug!(
                "Closed chunk {} with {} tokens (lines {}-{})",
                closed.index + 1,
                closed.tokens,
                closed.first_line,
                closed.last_line
            );
            chunks.push(closed);
            current.start(line, line_number, line_tokens);
        } else {
            current.text = candidate;
            current.tokens = candidate_tokens;
            current.last_line = line_number;
        }
    }

    if !current.is_empty() {
        chunks.push(current.close(chunks.len()));
    }

    Ok(chunks)
}

#[derive(Default)]
struct OpenChunk {
    text: String,
    first_line: usize,
    last_line: usize,
    tokens: usize,
}

impl OpenChunk {
    // `first_line` is 1-based, so 0 marks an empty chunk even for empty-string lines.
    fn is_empty(&self) -> bool {
        self.first_line == 0
    }

    fn start(&mut self, line: &str, line_number: usize, tokens: usize) {
        self.text = line.to_string();
        self.first_line = line_number;
        self.last_line = line_number;
        self.tokens = tokens;
    }

    fn close(&mut self, index: usize) -> Chunk {
        let open = std::mem::take(self);
        Chunk {
            index,
            first_line: open.first_line,
            last_line: open.last_line,
            tokens: open.tokens,
            text: open.text,
        }
    }
}
