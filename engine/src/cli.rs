//! CLI interface for Tourcast
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tourcast travel recommender
///
/// Answers Seoul travel questions using tourism documents and the weather
/// forecast for the date you ask about.
#[derive(Parser, Debug)]
#[command(name = "tourcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask for a travel recommendation
    Ask {
        /// The travel question, e.g. "내일 강남구 근처 조용한 곳 추천해줘"
        query: String,
    },

    /// Show the resolved date and its forecast without asking the LLM
    Forecast {
        /// Text containing a date expression
        query: String,
    },

    /// Look up a route between two places
    Route {
        /// Origin as "x,y" or "x,y,name=..."
        #[arg(long)]
        origin: String,

        /// Destination as "x,y" or "x,y,name=..."
        #[arg(long)]
        destination: String,

        /// Pipe-separated waypoints
        #[arg(long, default_value = "")]
        waypoints: String,
    },

    /// Run the HTTP API server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check configuration and credentials
    Doctor,
}
