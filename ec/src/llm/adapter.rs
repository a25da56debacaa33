//! LLM adapter used by the pipeline
//!
//! Wraps an optional [`LlmClient`]. Without a credential the adapter runs in
//! mock mode and answers every prompt with the caller's canned text; a failed
//! call degrades to the same canned text. Either way the pipeline receives a
//! [`Reply`] and needs no special-casing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{CompletionRequest, LlmClient, StopReason, create_client};
use crate::config::LlmConfig;

/// Where the text of a reply came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// Generated by the model
    Model,
    /// No credential configured
    Mock,
    /// The model call failed; carries the error message
    Fallback(String),
}

/// Text returned for one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    /// Warning to surface when the model call failed
    pub fn warning(&self, stage: &str) -> Option<String> {
        match &self.source {
            ReplySource::Fallback(error) => Some(format!("{} LLM call failed, used mock response: {}", stage, error)),
            _ => None,
        }
    }
}

/// Optional hosted model with canned fallback
#[derive(Clone)]
pub struct LlmAdapter {
    client: Option<Arc<dyn LlmClient>>,
    max_tokens: u32,
}

impl LlmAdapter {
    /// Build from config; mock mode when no API key is available
    pub fn from_config(config: &LlmConfig) -> Self {
        debug!(provider = %config.provider, model = %config.model, "LlmAdapter::from_config: called");
        let Some(api_key) = config.api_key() else {
            warn!(
                "{} environment variable not set, using mock LLM responses",
                config.api_key_env
            );
            return Self::mock();
        };

        match create_client(config, api_key) {
            Ok(client) => {
                info!("Using {} model {}", config.provider, config.model);
                Self::with_client(client, config.max_tokens)
            }
            Err(e) => {
                warn!("Could not initialise LLM client ({}), using mock LLM responses", e);
                Self::mock()
            }
        }
    }

    pub fn with_client(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self {
            client: Some(client),
            max_tokens,
        }
    }

    pub fn mock() -> Self {
        Self {
            client: None,
            max_tokens: 0,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.client.is_none()
    }

    /// Ask the model, or return `mock_text` in mock mode or on failure
    pub async fn ask(&self, prompt: &str, mock_text: impl Into<String>) -> Reply {
        debug!(prompt_len = prompt.len(), "LlmAdapter::ask: called");
        let Some(client) = &self.client else {
            debug!("LlmAdapter::ask: mock mode");
            return Reply {
                text: mock_text.into(),
                source: ReplySource::Mock,
            };
        };

        let request = CompletionRequest::user_prompt(prompt, self.max_tokens);
        let failure = match client.complete(request).await {
            Ok(response) => match response.text() {
                Some(text) => {
                    debug!(tokens = response.usage.total(), "LlmAdapter::ask: model replied");
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!("LLM reply was cut off at {} tokens", self.max_tokens);
                    }
                    return Reply {
                        text: text.to_string(),
                        source: ReplySource::Model,
                    };
                }
                None => "model returned no content".to_string(),
            },
            Err(e) => {
                if let Some(wait) = e.retry_after() {
                    warn!("LLM provider rate limited the request, retry after {:?}", wait);
                }
                e.to_string()
            }
        };

        warn!("LLM call failed, falling back to mock response: {}", failure);
        Reply {
            text: mock_text.into(),
            source: ReplySource::Fallback(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::ScriptedLlmClient;

    #[tokio::test]
    async fn test_mock_mode_returns_canned_text() {
        let adapter = LlmAdapter::mock();
        assert!(adapter.is_mock());

        let reply = adapter.ask("prompt", "canned").await;
        assert_eq!(reply.text, "canned");
        assert_eq!(reply.source, ReplySource::Mock);
        assert!(reply.warning("analyze_workflow").is_none());
    }

    #[tokio::test]
    async fn test_model_reply_is_trimmed() {
        let client = Arc::new(ScriptedLlmClient::replying(&["  generated text\n"]));
        let adapter = LlmAdapter::with_client(client.clone(), 256);

        let reply = adapter.ask("prompt", "canned").await;
        assert_eq!(reply.text, "generated text");
        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(client.prompts(), vec!["prompt"]);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_canned_text() {
        let client = Arc::new(ScriptedLlmClient::new(vec![Err(500)]));
        let adapter = LlmAdapter::with_client(client, 256);

        let reply = adapter.ask("prompt", "canned").await;
        assert_eq!(reply.text, "canned");
        assert!(matches!(reply.source, ReplySource::Fallback(_)));

        let warning = reply.warning("summarize").unwrap();
        assert!(warning.starts_with("summarize LLM call failed"));
        assert!(warning.contains("500"));
    }

    #[tokio::test]
    async fn test_blank_reply_falls_back() {
        let client = Arc::new(ScriptedLlmClient::replying(&["   "]));
        let adapter = LlmAdapter::with_client(client, 256);

        let reply = adapter.ask("prompt", "canned").await;
        assert_eq!(reply.text, "canned");
        assert_eq!(reply.source, ReplySource::Fallback("model returned no content".to_string()));
    }

    #[test]
    fn test_from_config_without_key_is_mock() {
        let config = LlmConfig {
            api_key_env: "ETL_COGNITION_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(LlmAdapter::from_config(&config).is_mock());
    }
}
