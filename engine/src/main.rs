// Tourcast travel recommender
// Main entry point for the tourcast binary

use clap::Parser;
use tourcast_engine::cli::{Cli, Command};
use tourcast_engine::config::Config;
use tourcast_engine::handlers::{
    handle_ask, handle_doctor, handle_forecast, handle_route, handle_serve, OutputFormat,
};
use tourcast_engine::routing::RouteRequest;
use tourcast_engine::secrets::SecretStore;
use tourcast_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // RUST_LOG > --log > config
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!(
        "Tourcast v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let secrets = SecretStore::from_env();

    match cli.command {
        Command::Ask { query } => {
            tracing::info!("Answering query");
            handle_ask(query, &config, &secrets, format).await
        }

        Command::Forecast { query } => handle_forecast(query, &config, &secrets, format).await,

        Command::Route {
            origin,
            destination,
            waypoints,
        } => {
            let request = RouteRequest::new(origin, destination).with_waypoints(waypoints);
            handle_route(request, &config, &secrets, format).await
        }

        Command::Serve { host, port } => {
            tracing::info!("Starting API server...");
            handle_serve(host, port, &config, &secrets).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, &secrets, format).await
        }
    }
}
