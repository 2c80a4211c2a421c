//! Document chunking.
//!
//! - `document`: reading markdown sources as non-empty lines
//! - `tokenizer`: token counting backends
//! - `chunker`: greedy token-bounded line chunking

pub mod chunker;
pub mod document;
pub mod tokenizer;

pub use chunker::{chunk_lines, split_lines, Chunk, Chunker, ChunkerConfig};
pub use document::{non_empty_lines, read_non_empty_lines, save_cleaned};
pub use tokenizer::{CharCounter, HfTokenCounter, TokenCounter, WhitespaceCounter};
