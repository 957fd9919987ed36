pub mod client;
pub mod mock;
pub mod prompts;

pub use client::{ChatMessage, LlmClient, OpenAiChatClient, generate};
pub use mock::MockLlmClient;
