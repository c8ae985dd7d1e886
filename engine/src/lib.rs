//! Tourcast Engine Library
//!
//! Answers free-text Seoul travel queries by combining tourism documents from
//! a retrieval index with the weather forecast for the date the user asked
//! about. Used by the `tourcast` binary and by integration tests.

/// Configuration management module
pub mod config;

/// Credential store and secret redaction
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Natural-language date resolution
pub mod date;

/// Region, keyword and preference extraction
pub mod intent;

/// Forecast horizon selection and normalization
pub mod weather;

/// Completion service abstraction layer
pub mod llm;

/// Retrieval index client
pub mod retrieval;

/// Prompt assembly
pub mod prompt;

/// Per-query pipeline coordinator
pub mod orchestrator;

/// Directions client
pub mod routing;

/// HTTP API server
pub mod server;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
