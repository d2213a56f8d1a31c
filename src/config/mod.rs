//! Configuration module for the tour backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var} value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for admin authentication (required in production)
    pub admin_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Base URL of the managed blob store, e.g. `https://assets.example.co`
    pub blob_base_url: Option<String>,
    /// Service key sent as bearer token on blob deletes
    pub blob_service_key: Option<String>,
    /// Deadline applied to every transition step
    pub step_timeout: Duration,
    /// Extra attempts for the status write that follows event deletion
    pub status_write_retries: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let admin_psk = env::var("TOUR_ADMIN_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("TOUR_DB_PATH")
            .unwrap_or_else(|_| "./data/tour.sqlite".to_string())
            .into();

        let bind_raw = env::var("TOUR_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "TOUR_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let log_level = env::var("TOUR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("TOUR_LOG_FORMAT").ok().as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "TOUR_LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected `text` or `json`".to_string(),
                })
            }
        };

        let blob_base_url = env::var("TOUR_BLOB_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string());
        let blob_service_key = env::var("TOUR_BLOB_SERVICE_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let step_timeout = Duration::from_secs(parse_number("TOUR_STEP_TIMEOUT_SECS", 30)?);
        let status_write_retries = parse_number("TOUR_STATUS_WRITE_RETRIES", 3)?;

        Ok(Self {
            admin_psk,
            db_path,
            bind_addr,
            log_level,
            log_format,
            blob_base_url,
            blob_service_key,
            step_timeout,
            status_write_retries,
        })
    }
}

fn parse_number<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
