//! Retrieval Index
//!
//! The retrieval index returns the best-matching tourism grounding text for a
//! free-text query. The engine treats the result as opaque: it is embedded in
//! the prompt verbatim and never parsed.
//!
//! [`HttpRetrievalIndex`] talks to a vector-search service over HTTP:
//! `POST {base_url}/query` with `{"query": "..."}`, answering
//! `{"response": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RetrievalConfig;
use crate::secrets::scrub_secrets;

/// Errors that can occur while querying the retrieval index
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Retrieval index unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval request timed out")]
    Timeout,

    #[error("Retrieval index returned {status}: {details}")]
    Upstream { status: u16, details: String },

    #[error("Failed to parse retrieval response: {0}")]
    Parse(String),
}

impl From<RetrievalError> for EngineError {
    fn from(err: RetrievalError) -> Self {
        EngineError::Retrieval(err.to_string())
    }
}

/// A ranked-text retrieval backend
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Returns the grounding text that best matches `text`
    async fn query(&self, text: &str) -> Result<String, RetrievalError>;
}

/// Retrieval index reached over HTTP
pub struct HttpRetrievalIndex {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    response: String,
}

impl HttpRetrievalIndex {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self, EngineError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl RetrievalIndex for HttpRetrievalIndex {
    async fn query(&self, text: &str) -> Result<String, RetrievalError> {
        let url = format!("{}/query", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest { query: text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout
                } else {
                    RetrievalError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = scrub_secrets(&response.text().await.unwrap_or_default());
            return Err(RetrievalError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Parse(e.to_string()))?;

        tracing::debug!("Retrieved {} chars of grounding", body.response.len());

        Ok(body.response)
    }
}
