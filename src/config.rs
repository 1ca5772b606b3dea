use chrono::{FixedOffset, Local};
use reqwest::Url;
use std::{env, time::Duration};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_BASE_URL: &str = "/api";
pub const DEFAULT_PROXY_ORIGIN: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_BASE_URL must be a path starting with '/' or an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("APP_UTC_OFFSET must look like +02:00, got {0:?}")]
    InvalidOffset(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    /// Absolute base URL every API path is appended to.
    pub api_base_url: String,
    pub initial_token: Option<String>,
    /// Offset used to derive calendar dates for bucketing.
    pub utc_offset: FixedOffset,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let raw_base = lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let origin = lookup("API_PROXY_ORIGIN").unwrap_or_else(|| DEFAULT_PROXY_ORIGIN.to_string());
        let api_base_url = resolve_base_url(&raw_base, &origin)?;

        let initial_token = lookup("FITNESS_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let utc_offset = match lookup("APP_UTC_OFFSET") {
            Some(raw) => raw
                .trim()
                .parse::<FixedOffset>()
                .map_err(|_| ConfigError::InvalidOffset(raw.clone()))?,
            None => *Local::now().offset(),
        };

        let request_timeout = lookup("API_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            port,
            api_base_url,
            initial_token,
            utc_offset,
            request_timeout,
        })
    }
}

/// A relative base (the dev proxy path) is served from `proxy_origin`; an
/// absolute one is used as is.
pub fn resolve_base_url(raw: &str, proxy_origin: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let resolved = if raw.starts_with('/') {
        format!("{}{}", proxy_origin.trim().trim_end_matches('/'), raw)
    } else {
        raw.to_string()
    };

    match Url::parse(&resolved) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(resolved.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::InvalidBaseUrl(raw.to_string())),
    }
}
