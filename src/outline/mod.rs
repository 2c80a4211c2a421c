//! Heading outlines extracted from documents.
//!
//! - `types`: the heading tree, fragments, and accumulated documents
//! - `merge`: folding per-chunk fragments into one outline

pub mod merge;
pub mod types;

pub use merge::{merge_children, merge_fragments, merge_outline, merge_toc, OutlineMerger};
pub use types::{
    flatten_titles, parse_outline, DetectedToc, HeadingNode, Outline, OutlineDocument,
    OutlineFragment,
};
