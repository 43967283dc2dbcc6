//! Service connection settings.

use std::time::Duration;

use crate::error::{AiError, AiResult};

/// Connection settings shared by the chat and video clients.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    /// Chat-completion deployment name
    pub deployment: String,
    /// API version for chat completions
    pub chat_api_version: String,
    /// API version for video generation
    pub video_api_version: String,
    /// Video model identifier sent with every job
    pub video_model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: "gpt-4o".to_string(),
            chat_api_version: "2024-10-21".to_string(),
            video_api_version: "preview".to_string(),
            video_model: "sora".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let defaults = Self::default();
        let config = Self {
            endpoint: std::env::var("AZURE_OPENAI_ENDPOINT")
                .map_err(|_| AiError::config("AZURE_OPENAI_ENDPOINT not set"))?,
            api_key: std::env::var("AZURE_OPENAI_API_KEY")
                .map_err(|_| AiError::config("AZURE_OPENAI_API_KEY not set"))?,
            deployment: std::env::var("AZURE_OPENAI_DEPLOYMENT").unwrap_or(defaults.deployment),
            chat_api_version: std::env::var("AZURE_OPENAI_CHAT_API_VERSION")
                .unwrap_or(defaults.chat_api_version),
            video_api_version: std::env::var("AZURE_OPENAI_VIDEO_API_VERSION")
                .unwrap_or(defaults.video_api_version),
            video_model: std::env::var("VIDEO_MODEL").unwrap_or(defaults.video_model),
            timeout: Duration::from_secs(
                std::env::var("AI_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AiResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AiError::config("endpoint is empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(AiError::config("api key is empty"));
        }
        Ok(())
    }

    /// Endpoint without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.video_api_version, "preview");
        assert_eq!(config.video_model, "sora");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_trims_slash() {
        let config = ServiceConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "key".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), "https://example.openai.azure.com");
    }
}
