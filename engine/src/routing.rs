//! Directions client
//!
//! Looks up a driving route between an origin, a destination and optional
//! waypoints. Endpoints are passed through as the provider expects them
//! (`"x,y"` coordinates or `"x,y,name=..."`); the engine does not geocode.
//!
//! Requests with a blank origin or destination are rejected before any
//! network call.

use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::RoutingConfig;
use crate::secrets::{scrub_secrets, SecretString};

/// Route lookup request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    /// Pipe-separated waypoints; empty when there are none
    #[serde(default)]
    pub waypoints: String,
}

impl RouteRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            waypoints: String::new(),
        }
    }

    pub fn with_waypoints(mut self, waypoints: impl Into<String>) -> Self {
        self.waypoints = waypoints.into();
        self
    }

    fn validate(&self) -> Result<(), RoutingError> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(RoutingError::MissingEndpoint);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("origin/destination is missing")]
    MissingEndpoint,

    #[error("directions API key is not configured")]
    MissingCredential,

    #[error("directions request failed: {0}")]
    Network(String),

    #[error("directions API failed with status {status}")]
    Upstream { status: u16, details: String },

    #[error("malformed directions response: {0}")]
    Parse(String),

    #[error("no routes returned")]
    NoRoutes,
}

impl RoutingError {
    /// HTTP status the API server answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RoutingError::MissingEndpoint => 400,
            RoutingError::NoRoutes => 404,
            _ => 500,
        }
    }
}

impl From<RoutingError> for EngineError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::MissingEndpoint => EngineError::InvalidInput(err.to_string()),
            RoutingError::MissingCredential => {
                EngineError::MissingCredential(crate::secrets::KAKAO_REST_API_KEY.to_string())
            }
            other => EngineError::Routing(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Value>,
}

/// Client for the directions REST API
pub struct RoutingClient {
    base_url: String,
    api_key: Option<SecretString>,
    client: Client,
}

impl RoutingClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_config(
        config: &RoutingConfig,
        api_key: Option<SecretString>,
    ) -> Result<Self, EngineError> {
        if api_key.is_none() {
            tracing::warn!("KAKAO_REST_API_KEY is not set; route lookups will fail");
        }
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// First route for the request, as the provider returned it
    pub async fn directions(&self, request: &RouteRequest) -> Result<Value, RoutingError> {
        request.validate()?;
        let api_key = self.api_key.as_ref().ok_or(RoutingError::MissingCredential)?;

        tracing::info!(
            "Route lookup {} -> {} (waypoints: {})",
            request.origin,
            request.destination,
            if request.waypoints.is_empty() {
                "none"
            } else {
                request.waypoints.as_str()
            }
        );

        let response = self
            .client
            .get(format!("{}/v1/directions", self.base_url))
            .header("Authorization", format!("KakaoAK {}", api_key.unsecure()))
            .query(&[
                ("origin", request.origin.as_str()),
                ("destination", request.destination.as_str()),
                ("waypoints", request.waypoints.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let details = scrub_secrets(&response.text().await.unwrap_or_default());
            tracing::warn!("Directions API returned {}", status);
            return Err(RoutingError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Parse(e.to_string()))?;

        body.routes.into_iter().next().ok_or(RoutingError::NoRoutes)
    }
}
