//! Backend module.

mod openai;

pub use openai::{OpenAiChatBackend, extract_content};
