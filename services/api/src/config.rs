//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub provider_base_url: String,
    /// `None` disables the provider timeout.
    pub provider_timeout: Option<Duration>,
    /// Selects Postgres storage when set; otherwise JSON files under `storage_dir`.
    pub database_url: Option<String>,
    pub storage_dir: PathBuf,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Provider Settings ---
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty());
        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string());
        let provider_base_url =
            lookup("PROVIDER_BASE_URL").unwrap_or_else(|| GEMINI_OPENAI_BASE_URL.to_string());

        let timeout_str = lookup("PROVIDER_TIMEOUT_SECS").unwrap_or_else(|| "30".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "PROVIDER_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a whole number of seconds", timeout_str),
            )
        })?;
        let provider_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        // --- Storage Settings ---
        let database_url = lookup("DATABASE_URL").filter(|u| !u.is_empty());
        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./storage"));

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            chat_model,
            provider_base_url,
            provider_timeout,
            database_url,
            storage_dir,
            allowed_origin,
        })
    }

    /// The provider credential, which the server cannot start without.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))
    }
}
