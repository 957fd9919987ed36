//! Scripted LLM client for tests. Pops canned responses in order and
//! reports itself unavailable once the script runs out.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::llm::client::{ChatMessage, LlmClient};

#[derive(Default)]
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<Result<String>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose every call fails, as if the service were down.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, response: impl Into<String>) {
        self.scripted
            .lock()
            .expect("mock script lock")
            .push_back(Ok(response.into()));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.scripted
            .lock()
            .expect("mock script lock")
            .push_back(Err(Error::Llm(message.into())));
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.scripted
            .lock()
            .expect("mock script lock")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Llm("mock llm: service unavailable".to_string())))
    }
}
