//! Fuzzy validation of extracted outlines against their source lines.

pub mod line_match;
pub mod similarity;

pub use line_match::{
    find_best_line, is_confident, BestLine, LineMatcher, MatchResult, ValidationReport,
};
pub use similarity::{matching_blocks, ratio, round3, MatchingBlock};
