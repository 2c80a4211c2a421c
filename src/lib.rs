pub mod chunking;
pub mod conversation;
pub mod core;
pub mod extract;
pub mod llm;
pub mod outline;
pub mod validate;
