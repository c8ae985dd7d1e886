//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - ask: Run one query through the recommendation pipeline
//! - forecast: Resolve a date and show its forecast
//! - route: Look up directions
//! - serve: Run the HTTP API until Ctrl-C
//! - doctor: Validate configuration and credentials

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::config::{Config, VALID_PROVIDERS};
use crate::orchestrator::RecommendationOrchestrator;
use crate::routing::{RouteRequest, RoutingClient};
use crate::secrets::{
    SecretStore, GROQ_API_KEY, KAKAO_REST_API_KEY, KNOWN_KEYS, OPENAI_API_KEY, WEATHER_API_KEY,
};
use crate::server::{router, ApiServer};
use crate::weather::WeatherFusion;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Answer a travel query
pub async fn handle_ask(
    query: String,
    config: &Config,
    secrets: &SecretStore,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = RecommendationOrchestrator::from_config(config, secrets)
        .context("Failed to set up the recommendation pipeline")?;

    let recommendation = orchestrator.handle(&query).await?;

    match format {
        OutputFormat::Text => {
            println!(
                "날짜: {} ({}일 후)",
                recommendation.date, recommendation.days_ahead
            );
            println!("날씨: {}", recommendation.weather);
            println!();
            println!("{}", recommendation.answer);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
        }
    }

    Ok(())
}

/// Show the resolved date and forecast for a query
pub async fn handle_forecast(
    query: String,
    config: &Config,
    secrets: &SecretStore,
    format: OutputFormat,
) -> Result<()> {
    let weather = WeatherFusion::from_config(
        &config.weather,
        secrets.optional(WEATHER_API_KEY),
        config.utc_offset(),
    )?;

    let (date, summary) =
        RecommendationOrchestrator::forecast_at(&weather, &query, Utc::now(), config.utc_offset())
            .await;

    match format {
        OutputFormat::Text => {
            println!("Date:          {} ({} days ahead)", date, date.days_ahead());
            println!("Temperature:   {}", summary.temperature);
            println!("Precipitation: {}", summary.precipitation);
            println!("Condition:     {}", summary.condition);
        }
        OutputFormat::Json => {
            let output = json!({
                "date": date.to_string(),
                "days_ahead": date.days_ahead(),
                "weather": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Look up a route
pub async fn handle_route(
    request: RouteRequest,
    config: &Config,
    secrets: &SecretStore,
    format: OutputFormat,
) -> Result<()> {
    let client = RoutingClient::from_config(&config.routing, secrets.optional(KAKAO_REST_API_KEY))?;

    let route = client
        .directions(&request)
        .await
        .map_err(sdk::errors::EngineError::from)?;

    match format {
        OutputFormat::Text => {
            let summary = &route["summary"];
            println!("{} -> {}", request.origin, request.destination);
            if let Some(distance) = summary["distance"].as_u64() {
                println!("  Distance: {:.1} km", distance as f64 / 1000.0);
            }
            if let Some(duration) = summary["duration"].as_u64() {
                println!("  Duration: {} min", duration / 60);
            }
            if summary.is_null() {
                println!("{}", serde_json::to_string_pretty(&route)?);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
    }

    Ok(())
}

/// Run the HTTP API until Ctrl-C
pub async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    config: &Config,
    secrets: &SecretStore,
) -> Result<()> {
    let orchestrator = Arc::new(
        RecommendationOrchestrator::from_config(config, secrets)
            .context("Failed to set up the recommendation pipeline")?,
    );
    let routing = Arc::new(RoutingClient::from_config(
        &config.routing,
        secrets.optional(KAKAO_REST_API_KEY),
    )?);

    let bind = format!(
        "{}:{}",
        host.unwrap_or_else(|| config.server.host.clone()),
        port.unwrap_or(config.server.port)
    );

    let server = ApiServer::start(&bind, router(orchestrator, routing)).await?;
    println!("Tourcast API listening on http://{}", server.addr());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Received Ctrl-C");
    server.stop().await;
    Ok(())
}

/// Result of the configuration and credential checks
#[derive(Debug, Default)]
pub struct DoctorReport {
    pub checks: Vec<(String, String)>,
    pub issues: Vec<String>,
}

impl DoctorReport {
    fn check(&mut self, name: &str, status: impl Into<String>) {
        self.checks.push((name.to_string(), status.into()));
    }

    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check configuration validity and which credentials are present
pub fn diagnose(config: &Config, secrets: &SecretStore) -> DoctorReport {
    let mut report = DoctorReport::default();

    match config.validate() {
        Ok(()) => report.check("Configuration", "Valid"),
        Err(e) => {
            report.check("Configuration", "Invalid");
            report.issues.push(e.to_string());
        }
    }

    report.check(
        "LLM provider",
        format!(
            "{} (one of {})",
            config.llm.default_provider,
            VALID_PROVIDERS.join(", ")
        ),
    );

    for key in KNOWN_KEYS {
        let status = if secrets.has_secret(key) {
            "Configured"
        } else {
            "Not configured"
        };
        report.check(key, status);
    }

    let provider_key = match config.llm.default_provider.as_str() {
        "groq" => Some(GROQ_API_KEY),
        "openai" => Some(OPENAI_API_KEY),
        _ => None,
    };
    if let Some(key) = provider_key {
        if !secrets.has_secret(key) {
            report.issues.push(format!(
                "{} is required for the '{}' provider",
                key, config.llm.default_provider
            ));
        }
    }

    if !secrets.has_secret(WEATHER_API_KEY) {
        report
            .issues
            .push("WEATHER_API_KEY is not set; forecasts will report no data".to_string());
    }

    if !secrets.has_secret(KAKAO_REST_API_KEY) {
        report
            .issues
            .push("KAKAO_REST_API_KEY is not set; route lookups will fail".to_string());
    }

    report.check("Retrieval service", config.retrieval.base_url.clone());
    report
}

/// Print the diagnostics report
pub async fn handle_doctor(
    config: &Config,
    secrets: &SecretStore,
    format: OutputFormat,
) -> Result<()> {
    let report = diagnose(config, secrets);

    match format {
        OutputFormat::Text => {
            println!("Tourcast Diagnostics");
            println!("============================");
            println!();

            println!("Checks:");
            for (check, status) in &report.checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if report.is_healthy() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in report.issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": report.checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": report.issues,
                "healthy": report.is_healthy()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
