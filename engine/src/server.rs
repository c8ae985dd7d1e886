//! HTTP API
//!
//! Exposes the recommendation pipeline and the directions lookup as JSON
//! endpoints.
//!
//! # Endpoints
//!
//! - POST /api/recommend - Answer a travel query
//! - POST /api/route - Look up a route between two places
//! - GET /api/status - Liveness and version
//!
//! Cross-origin requests are allowed from anywhere; the browser front end is
//! served separately.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::errors::{EngineError, EngineErrorExt};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::orchestrator::RecommendationOrchestrator;
use crate::routing::{RouteRequest, RoutingClient, RoutingError};

/// State shared across handlers
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<RecommendationOrchestrator>,
    routing: Arc<RoutingClient>,
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    #[serde(default)]
    query: String,
}

/// Build the API router
pub fn router(orchestrator: Arc<RecommendationOrchestrator>, routing: Arc<RoutingClient>) -> Router {
    let state = AppState {
        orchestrator,
        routing,
    };

    Router::new()
        .route("/api/recommend", post(recommend_handler))
        .route("/api/route", post(route_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Status code for a failed recommendation
fn recommend_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::LLMTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Body for a request whose JSON could not be read
fn malformed_body(rejection: JsonRejection) -> Response {
    tracing::debug!("Rejected request body: {}", rejection);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

async fn recommend_handler(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(rejection),
    };

    match state.orchestrator.handle(&request.query).await {
        Ok(recommendation) => Json(recommendation).into_response(),
        Err(err) => {
            tracing::warn!("Recommendation failed: {}", err);
            let status = recommend_status(&err);
            let body = if status == StatusCode::BAD_REQUEST {
                json!({ "error": err.to_string() })
            } else {
                json!({ "error": err.to_string(), "hint": err.user_hint() })
            };
            (status, Json(body)).into_response()
        }
    }
}

async fn route_handler(
    State(state): State<AppState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(rejection),
    };

    match state.routing.directions(&request).await {
        Ok(route) => Json(route).into_response(),
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = match &err {
                RoutingError::Upstream { status, details } => json!({
                    "error": "Directions API failed",
                    "status_code": status,
                    "details": details,
                }),
                other => json!({ "error": other.to_string() }),
            };
            (status, Json(body)).into_response()
        }
    }
}

async fn status_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// A running API server
pub struct ApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Bind `bind` and serve `app` in a background task
    pub async fn start(bind: &str, app: Router) -> Result<Self, EngineError> {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", bind, e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tracing::info!("API server listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                    tracing::info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("API server error: {}", e);
                });
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish
    pub async fn stop(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send(()).ok();
        }
        if let Err(e) = self.handle.await {
            tracing::error!("API server task failed: {}", e);
        }
        tracing::info!("API server stopped");
    }
}
