//! Completion Service Abstraction Layer
//!
//! This module provides a common interface for text-generation backends.
//! The `LLMProvider` trait is the seam the orchestrator depends on: it takes
//! a system prompt and a user prompt and returns generated text. Concrete
//! providers speak the OpenAI-compatible chat-completions protocol (OpenAI
//! itself and Groq).

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::LLMConfig;
use crate::secrets::{SecretStore, GROQ_API_KEY, OPENAI_API_KEY};

pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        EngineError::LLMProvider(err.to_string())
    }
}

/// Message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Sampling options for a completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum number of generated tokens
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Build options from the `[llm]` config section
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 1000,
        }
    }
}

/// LLM Provider trait that all completion backends implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai", "groq")
    fn name(&self) -> &str;

    /// Generate a completion for the given conversation
    ///
    /// # Arguments
    /// * `messages` - System prompt followed by the user prompt
    /// * `options` - Sampling temperature and token budget
    ///
    /// # Returns
    /// * `Ok(String)` - The generated text
    /// * `Err(LLMError)` - If the request fails
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String>;
}

/// Build the configured default provider.
///
/// # Errors
///
/// Returns `EngineError::MissingCredential` when the provider's API key is not
/// in the environment, or `EngineError::Config` for an unknown provider name.
pub fn build_provider(
    config: &LLMConfig,
    secrets: &SecretStore,
) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    let provider = match config.default_provider.as_str() {
        "openai" => openai::OpenAIProvider::new(
            "openai",
            config.openai.base_url.clone(),
            config.openai.model.clone(),
            secrets.get_secret(OPENAI_API_KEY)?,
        )?,
        "groq" => openai::OpenAIProvider::new(
            "groq",
            config.groq.base_url.clone(),
            config.groq.model.clone(),
            secrets.get_secret(GROQ_API_KEY)?,
        )?,
        other => {
            return Err(EngineError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            )))
        }
    };

    tracing::info!(
        "Using LLM provider {} ({})",
        provider.name(),
        provider.model()
    );

    Ok(Arc::new(provider))
}
