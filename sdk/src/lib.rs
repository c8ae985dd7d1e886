//! Tourcast SDK
//!
//! Shared library providing the error taxonomy used by the engine, the CLI
//! and the API server.

/// Error types and handling
pub mod errors;

// Re-export commonly used types
pub use errors::{EngineError, EngineErrorExt};
