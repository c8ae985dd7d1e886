pub mod string;

pub use string::SecretString;

use regex::Regex;
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable holding the Groq API key
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

/// Environment variable holding the public weather data service key
pub const WEATHER_API_KEY: &str = "WEATHER_API_KEY";

/// Environment variable holding the directions REST API key
pub const KAKAO_REST_API_KEY: &str = "KAKAO_REST_API_KEY";

/// Every credential the engine knows how to use
pub const KNOWN_KEYS: [&str; 4] = [
    OPENAI_API_KEY,
    GROQ_API_KEY,
    WEATHER_API_KEY,
    KAKAO_REST_API_KEY,
];

/// SecretStore holds the API credentials read once at startup.
///
/// Values come from the process environment (a `.env` loader or the service
/// manager is expected to populate it). Empty values are treated as absent.
/// The store is immutable after construction and is shared read-only by
/// every request.
#[derive(Clone, Default)]
pub struct SecretStore {
    secrets: HashMap<String, SecretString>,
}

/// Regex patterns for detecting common secret formats.
/// These are compiled once and reused for performance.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,}
/// - Groq API keys: gsk_[a-zA-Z0-9]{20,}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
/// - Directions API keys: KakaoAK\s+[^\s]+
/// - Weather service keys echoed in URLs: serviceKey=[^&\s]+
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid OpenAI pattern"),
            Regex::new(r"gsk_[a-zA-Z0-9]{20,}").expect("Invalid Groq pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
            Regex::new(r"KakaoAK\s+[^\s]+").expect("Invalid KakaoAK pattern"),
            Regex::new(r"serviceKey=[^&\s]+").expect("Invalid serviceKey pattern"),
        ]
    })
}

impl SecretStore {
    /// Load every known credential from the environment
    pub fn from_env() -> Self {
        Self::from_pairs(
            KNOWN_KEYS
                .iter()
                .filter_map(|key| std::env::var(key).ok().map(|value| (*key, value))),
        )
    }

    /// Build a store from explicit key/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let secrets = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, String)| !v.trim().is_empty())
            .map(|(k, v)| (k, SecretString::new(v)))
            .collect();

        Self { secrets }
    }

    /// Returns the credential stored under `key`
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        self.secrets
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::MissingCredential(key.to_string()))
    }

    /// Returns the credential if present
    pub fn optional(&self, key: &str) -> Option<SecretString> {
        self.secrets.get(key).cloned()
    }

    /// Checks whether a credential is present
    pub fn has_secret(&self, key: &str) -> bool {
        self.secrets.contains_key(key)
    }
}

/// Removes known secret formats from `input`
pub fn scrub_secrets(input: &str) -> String {
    get_secret_patterns()
        .iter()
        .fold(input.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, "[REDACTED]").into_owned()
        })
}
