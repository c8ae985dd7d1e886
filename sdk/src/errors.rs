//! Error types and handling
//!
//! This module provides the error types shared by the Tourcast engine and its
//! outer surfaces (CLI, API server). All errors implement the `EngineErrorExt`
//! trait which provides user-friendly hints and indicates whether errors are
//! recoverable.
//!
//! # Security
//!
//! All hints are static strings:
//! - No secrets (API keys, service keys) are included
//! - No upstream response bodies are echoed back
//! - All hints are safe to display to end users

use thiserror::Error;

/// Trait for engine error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait EngineErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or upstream response details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller. Non-recoverable
    /// errors typically require a configuration change.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Input**: the request is missing required text
/// - **Configuration**: invalid config file or missing credentials
/// - **Retrieval**: the retrieval index failed (hard failure)
/// - **LLM Provider**: the completion service failed or timed out (hard failure)
/// - **Routing**: the directions provider failed
///
/// Weather provider problems never surface here; they degrade to sentinel
/// values inside the weather module.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, EngineErrorExt};
///
/// let error = EngineError::InvalidInput("query is empty".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::MissingCredential("OPENAI_API_KEY".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    // Retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out after {0}s")]
    LLMTimeout(u64),

    // Routing errors
    #[error("Routing error: {0}")]
    Routing(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),
}

impl EngineErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::InvalidInput(_) => "Please enter a travel question",

            Self::Config(_) => "Check your config.toml file for errors",
            Self::MissingCredential(_) => "Set the required API key in the environment",

            Self::Retrieval(_) => "Travel information search is unavailable. Try again later",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::LLMTimeout(_) => "LLM provider took too long to respond. Try again",

            Self::Routing(_) => "Route lookup failed. Check origin and destination",

            Self::Network(_) => "Network operation failed. Check your connection",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::MissingCredential(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
