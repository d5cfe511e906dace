//! Configuration module for the admin dashboard.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ResourceError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the admin REST API
    pub api_base_url: String,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Interval between notification polls
    pub poll_interval: Duration,
    /// Rows per page for paginated lists
    pub page_size: usize,
    /// How long success/error notices stay visible
    pub notice_ttl: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(30),
            page_size: 10,
            notice_ttl: Duration::from_secs(3),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ResourceError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_base_url = env::var("ADMIN_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let api_token = env::var("ADMIN_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let request_timeout = parse_var::<u64>("ADMIN_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let poll_interval = parse_var::<u64>("ADMIN_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        if poll_interval.is_zero() {
            return Err(ResourceError::config(
                "ADMIN_POLL_INTERVAL_SECS must be greater than zero",
            ));
        }

        let page_size = parse_var::<usize>("ADMIN_PAGE_SIZE")?.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(ResourceError::config(
                "ADMIN_PAGE_SIZE must be greater than zero",
            ));
        }

        let notice_ttl = parse_var::<u64>("ADMIN_NOTICE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.notice_ttl);

        let log_level = env::var("ADMIN_LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_format = match env::var("ADMIN_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => {
                return Err(ResourceError::config(format!(
                    "Invalid ADMIN_LOG_FORMAT '{}', expected 'text' or 'json'",
                    other
                )))
            }
        };

        Ok(Self {
            api_base_url,
            api_token,
            request_timeout,
            poll_interval,
            page_size,
            notice_ttl,
            log_level,
            log_format,
        })
    }
}

/// Parse an optional environment variable, rejecting malformed values.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ResourceError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ResourceError::config(format!("Invalid {} value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
