//! Chat-completion client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{AiError, AiResult};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// One-round-trip text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `user_text` with `system_instructions` and return the reply text.
    async fn ask(&self, user_text: &str, system_instructions: &str) -> AiResult<String>;
}

/// Chat-completion client for a deployed model.
pub struct ChatCompletionClient {
    http: Client,
    config: ServiceConfig,
}

impl ChatCompletionClient {
    pub fn new(config: ServiceConfig) -> AiResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AiError::Network)?;

        Ok(Self { http, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.config.base_url(),
            self.config.deployment
        )
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn ask(&self, user_text: &str, system_instructions: &str) -> AiResult<String> {
        let url = self.completions_url();
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_instructions,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        debug!("Sending chat completion request to {}", url);

        let response = self
            .http
            .post(&url)
            .query(&[("api-version", self.config.chat_api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request_failed(status.as_u16(), body));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::invalid_response("No content in chat completion response"))
    }
}
