use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::format::Currency;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub default_currency: Currency,
    pub recompute_debounce: Duration,
    pub api_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let default_currency = env_map
            .get("DEFAULT_CURRENCY")
            .map(|s| s.as_str())
            .unwrap_or("INR")
            .parse::<Currency>()
            .map_err(|e| ConfigError::InvalidValue("DEFAULT_CURRENCY".to_string(), e.to_string()))?;

        let debounce_ms = env_map
            .get("RECOMPUTE_DEBOUNCE_MS")
            .map(|s| s.as_str())
            .unwrap_or("300")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "RECOMPUTE_DEBOUNCE_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let api_base_url = env_map
            .get("API_BASE_URL")
            .cloned()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("must be an http(s) URL, got {}", api_base_url),
            ));
        }

        Ok(Config {
            port,
            database_path,
            default_currency,
            recompute_debounce: Duration::from_millis(debounce_ms),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}
