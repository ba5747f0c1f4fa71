//! Environment-driven configuration for the session client.

use crate::backoff::BackoffPolicy;
use gemini_realtime_types::tool::Tool;
use std::time::Duration;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Model used when `GEMINI_LIVE_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";

const ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Holds all configuration for one session client.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    /// Bound on the transport handshake; exceeding it forces a retry.
    pub connect_timeout: Duration,
    pub backoff: BackoffPolicy,
    /// Capability schemas advertised to the backend at setup, passed
    /// through opaquely.
    pub tools: Vec<Tool>,
}

impl SessionConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let model =
            std::env::var("GEMINI_LIVE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let connect_timeout = match std::env::var("GEMINI_CONNECT_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidValue(
                        "GEMINI_CONNECT_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a number of seconds", raw),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            api_key,
            model,
            endpoint: ENDPOINT.to_string(),
            connect_timeout,
            backoff: BackoffPolicy::default(),
            tools: Vec::new(),
        })
    }

    /// Full websocket URL with the API key in the query string.
    pub fn url(&self) -> String {
        format!("{}?key={}", self.endpoint, self.api_key)
    }
}
