pub mod client;
pub mod error;
mod prompt;
pub mod types;

pub use client::{CommentComposer, OpenAiComposer};
pub use error::AiError;
pub use types::CommentSuggestions;
