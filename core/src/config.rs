//! Client configuration.
//!
//! Timeouts are off unless set. The gateway never retries, so a configured
//! timeout is the only bound on how long a call can take.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

pub const ENV_BASE_URL: &str = "CATALOG_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CATALOG_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CATALOG_CONNECT_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Total time allowed for one request, response body included.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Headers sent with every request unless a caller overrides them by name.
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            timeout: None,
            connect_timeout: None,
            default_headers: vec![("content-type".to_string(), "application/json".to_string())],
        })
    }

    /// Load from `CATALOG_API_URL`, `CATALOG_TIMEOUT_SECS` and
    /// `CATALOG_CONNECT_TIMEOUT_SECS`, falling back to `DEFAULT_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;
        config.timeout = parse_secs(ENV_TIMEOUT_SECS, lookup(ENV_TIMEOUT_SECS))?;
        config.connect_timeout =
            parse_secs(ENV_CONNECT_TIMEOUT_SECS, lookup(ENV_CONNECT_TIMEOUT_SECS))?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Add or replace a default header. Names compare case-insensitively.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match self.default_headers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.default_headers.push((name, value.to_string())),
        }
        self
    }
}

fn parse_secs(key: &str, raw: Option<String>) -> Result<Option<Duration>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Config(format!("{key} must be a whole number of seconds, got {raw:?}")))?;
    Ok(Some(Duration::from_secs(secs)))
}
