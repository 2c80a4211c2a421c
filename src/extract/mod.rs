//! LLM-driven structure extraction.
//!
//! - `json`: recovering a JSON object from model replies
//! - `prompt`: the incremental extraction prompt
//! - `extractor`: the `StructureExtractor` seam and its LLM implementation
//! - `pipeline`: chunk, extract, merge, checkpoint, validate

pub mod extractor;
pub mod json;
pub mod pipeline;
pub mod prompt;

pub use extractor::{LlmStructureExtractor, StructureExtractor};
pub use json::extract_json_object;
pub use pipeline::{Checkpoint, OutlinePipeline, PipelineOutcome};
pub use prompt::build_extraction_prompt;
