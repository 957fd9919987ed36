use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::utils::StripCodeBlock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Text-generation collaborator. The pipeline treats it as an opaque
/// function that may fail or return malformed output; callers are expected
/// to fall back deterministically rather than propagate its errors.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Requests a structured completion and parses it into `T`.
///
/// Decode failures surface as `Error::Llm`; no retries happen here.
pub async fn generate<T: DeserializeOwned>(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
) -> Result<T> {
    let raw = client.complete(messages).await?;
    let cleaned = raw.strip_code_block();
    debug!("LLM raw response: {} chars", cleaned.len());
    serde_json::from_str(cleaned)
        .map_err(|e| Error::Llm(format!("malformed structured output: {e}")))
}

/// OpenAI-compatible chat completion client.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: settings.openai_api_base.clone(),
            api_key: settings.openai_api_key.clone(),
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
            max_tokens: settings.llm_max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Chat completion failed with status {status}");
            return Err(Error::Llm(format!(
                "chat completion failed with status {status}"
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| Error::Llm("missing message content in completion".to_string()))
    }
}
