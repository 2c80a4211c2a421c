//! Tool-calling conversations and their ChatML rendering.

pub mod format;
pub mod tool_call;
pub mod types;

pub use format::{render_chatml, render_turn};
pub use tool_call::{extract_tool_call, ToolCall};
pub use types::{Conversation, Role, Turn};
