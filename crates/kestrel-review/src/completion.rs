use std::time::Duration;

use kestrel_core::{CompletionConfig, KestrelError};
use serde::{Deserialize, Serialize};

/// A message in a chat conversation with the completion service.
///
/// # Examples
///
/// ```
/// use kestrel_review::completion::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use kestrel_review::completion::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// A stateless request/response boundary to the text-completion service.
///
/// The pipeline is generic over this trait so tests can substitute a fake
/// service; retries, rate limiting, and auth belong to implementations,
/// never to the orchestrator.
#[allow(async_fn_in_trait)]
pub trait CompletionService {
    /// Model identifier requests are sent with.
    fn model(&self) -> &str;

    /// Send a conversation and return the single best completion's text.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Completion`] when the service produces no
    /// usable response (empty or absent choice list).
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, KestrelError>;
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions`
/// endpoint: Groq, OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use kestrel_core::CompletionConfig;
/// use kestrel_review::completion::CompletionClient;
///
/// let config = CompletionConfig {
///     api_key: Some("test-key".into()),
///     ..CompletionConfig::default()
/// };
/// let client = CompletionClient::new(&config).unwrap();
/// ```
pub struct CompletionClient {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a new completion client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Completion`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &CompletionConfig) -> Result<Self, KestrelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| KestrelError::Completion(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn base_url(&self) -> &str {
        if let Some(url) = self.config.base_url.as_deref() {
            return url;
        }
        match self.config.provider.as_str() {
            "groq" => "https://api.groq.com/openai",
            _ => "https://api.openai.com",
        }
    }
}

impl CompletionService for CompletionClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Completion`] on HTTP errors, response
    /// parsing failures, or an empty choice list.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, KestrelError> {
        let url = format!("{}/v1/chat/completions", self.base_url());

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.1,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| KestrelError::Completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KestrelError::Completion(format!(
                "completion API error {status}: {body_text}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| KestrelError::Completion(format!("failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KestrelError::Completion("no valid response: empty choice list".into()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| KestrelError::Completion("no valid response: choice had no content".into()))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_succeeds() {
        let config = CompletionConfig::default();
        let client = CompletionClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn model_returns_config_model() {
        let config = CompletionConfig {
            model: "mixtral-8x7b-32768".into(),
            ..CompletionConfig::default()
        };
        let client = CompletionClient::new(&config).unwrap();
        assert_eq!(client.model(), "mixtral-8x7b-32768");
    }

    #[test]
    fn base_url_follows_provider() {
        let groq = CompletionClient::new(&CompletionConfig::default()).unwrap();
        assert_eq!(groq.base_url(), "https://api.groq.com/openai");

        let custom = CompletionClient::new(&CompletionConfig {
            base_url: Some("http://localhost:11434".into()),
            ..CompletionConfig::default()
        })
        .unwrap();
        assert_eq!(custom.base_url(), "http://localhost:11434");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn response_with_empty_choices_parses() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.choices.is_empty());

        let parsed: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn response_content_is_optional() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
