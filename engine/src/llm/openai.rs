//! OpenAI-compatible chat-completions provider
//!
//! Serves both OpenAI and Groq, which expose the same `/chat/completions`
//! contract under different base URLs and keys.

use async_trait::async_trait;
use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};

use super::{CompletionOptions, LLMError, LLMProvider, Message, Result};
use crate::secrets::{scrub_secrets, SecretString};

pub struct OpenAIProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: SecretString,
    client: Client,
}

impl OpenAIProvider {
    /// Create a provider for an OpenAI-compatible endpoint
    ///
    /// The completion timeout is enforced by the caller, so the client itself
    /// carries no request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> std::result::Result<Self, EngineError> {
        let client = Client::builder()
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
        })
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            "{} request: model={}, messages={}, total_chars={}",
            self.name,
            self.model,
            messages.len(),
            messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.unsecure())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to {} at {}",
                        self.name, self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(format!(
                    "{} API error ({}): {}",
                    self.name, status, text
                )),
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        tracing::info!(
            "{} response received in {:.1}s",
            self.name,
            start.elapsed().as_secs_f64()
        );

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LLMError::ParseError("Empty content".to_string())),
        }
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

/// Chat-completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_properties() {
        let provider = OpenAIProvider::new(
            "groq",
            "https://api.groq.com/openai/v1/",
            "llama3-8b-8192",
            SecretString::new("gsk_test"),
        )
        .unwrap();

        assert_eq!(provider.name(), "groq");
        assert_eq!(provider.model(), "llama3-8b-8192");
        assert_eq!(provider.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("policy"), Message::user("query")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.6,
            max_tokens: 1000,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "query");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_response_without_choices_parses() {
        let data: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(data.choices.is_empty());
    }
}
