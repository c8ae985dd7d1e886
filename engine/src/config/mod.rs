//! Configuration management
//!
//! This module handles loading, validation, and management of the Tourcast
//! configuration. Configuration is stored in TOML format at
//! ~/.tourcast/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and the provider-local UTC offset
//! - **llm**: Completion provider selection, models and sampling options
//! - **retrieval**: Retrieval index endpoint
//! - **weather**: Short-range and mid-range forecast endpoints and fixed locations
//! - **routing**: Directions provider endpoint
//! - **server**: API server bind address
//!
//! API keys are never stored in the config file; they are read from the
//! environment by [`crate::secrets::SecretStore`].
//!
//! # Examples
//!
//! ```no_run
//! use tourcast_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Default provider: {}", config.llm.default_provider);
//! println!("Forecast grid: {}/{}", config.weather.nx, config.weather.ny);
//! # Ok(())
//! # }
//! ```

use chrono::{FixedOffset, Offset, Utc};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Providers accepted for `llm.default_provider`
pub const VALID_PROVIDERS: [&str; 2] = ["openai", "groq"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Completion provider configuration
    pub llm: LLMConfig,

    /// Retrieval index configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Routing provider configuration
    #[serde(default)]
    pub routing: RoutingConfig,

    /// API server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// UTC offset in hours used for "today" and forecast issuance times
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for recommendations (openai, groq)
    pub default_provider: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the generated answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound for a single completion call
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Groq provider settings
    #[serde(default)]
    pub groq: GroqConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key read from OPENAI_API_KEY, not stored in config
}

/// Groq provider configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// Base URL for Groq's OpenAI-compatible API
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_groq_model")]
    pub model: String,
    // Note: API key read from GROQ_API_KEY, not stored in config
}

/// Retrieval index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval service
    #[serde(default = "default_retrieval_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Short-range (village) forecast endpoint
    #[serde(default = "default_short_range_url")]
    pub short_range_url: String,

    /// Mid-range land forecast endpoint
    #[serde(default = "default_mid_range_url")]
    pub mid_range_url: String,

    /// Forecast grid X coordinate for the short-range source
    #[serde(default = "default_nx")]
    pub nx: u32,

    /// Forecast grid Y coordinate for the short-range source
    #[serde(default = "default_ny")]
    pub ny: u32,

    /// Broad region code for the mid-range source
    #[serde(default = "default_mid_region_id")]
    pub mid_region_id: String,

    /// Request timeout (seconds)
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

/// Routing provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of the directions API
    #[serde(default = "default_routing_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_temperature() -> f32 {
    0.6
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_groq_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_retrieval_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_retrieval_timeout() -> u64 {
    30
}

fn default_short_range_url() -> String {
    "http://apis.data.go.kr/1360000/VilageFcstInfoService_2.0/getVilageFcst".to_string()
}

fn default_mid_range_url() -> String {
    "http://apis.data.go.kr/1360000/MidFcstInfoService/getMidLandFcst".to_string()
}

// Seoul grid point
fn default_nx() -> u32 {
    60
}

fn default_ny() -> u32 {
    127
}

// Seoul, Incheon, Gyeonggi
fn default_mid_region_id() -> String {
    "11B00000".to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

fn default_routing_base_url() -> String {
    "https://apis-navi.kakaomobility.com".to_string()
}

fn default_routing_timeout() -> u64 {
    10
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    5000
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_base_url(),
            model: default_groq_model(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_retrieval_base_url(),
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            short_range_url: default_short_range_url(),
            mid_range_url: default_mid_range_url(),
            nx: default_nx(),
            ny: default_ny(),
            mid_region_id: default_mid_region_id(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_base_url(),
            timeout_secs: default_routing_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
            openai: OpenAIConfig::default(),
            groq: GroqConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                utc_offset_hours: default_utc_offset_hours(),
            },
            llm: LLMConfig::default(),
            retrieval: RetrievalConfig::default(),
            weather: WeatherConfig::default(),
            routing: RoutingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.tourcast/config.toml)
    ///
    /// If the configuration file doesn't exist, writes a default configuration
    /// there first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());

        Ok(config)
    }

    /// Get the default configuration file path (~/.tourcast/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".tourcast").join("config.toml"))
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level or provider name is unknown
    /// - Sampling options or timeouts are out of range
    /// - The UTC offset is not a real time zone offset
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(EngineError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        let timeouts = [
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("retrieval.timeout_secs", self.retrieval.timeout_secs),
            ("weather.timeout_secs", self.weather.timeout_secs),
            ("routing.timeout_secs", self.routing.timeout_secs),
        ];
        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(EngineError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if !(-12..=14).contains(&self.core.utc_offset_hours) {
            return Err(EngineError::Config(
                "utc_offset_hours must be between -12 and 14".to_string(),
            ));
        }

        Ok(())
    }

    /// Offset used to compute "today" and forecast issuance times
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_hours(self.core.utc_offset_hours)
    }

    /// Completion call bound
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

/// Convert whole hours into a fixed offset, falling back to UTC when out of range
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}
