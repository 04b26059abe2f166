use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_DELETE_CONFIRM_TTL_SECS: u64 = 60;

/// Connection and behaviour settings shared by every component.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base path every request is resolved against, e.g. `http://host:8000/api`.
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_page_size: u32,
    /// How long a pending delete confirmation stays valid.
    pub delete_confirm_ttl_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_page_size: DEFAULT_PAGE_SIZE,
            delete_confirm_ttl_secs: DEFAULT_DELETE_CONFIRM_TTL_SECS,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delete_confirm_ttl(&self) -> Duration {
        Duration::from_secs(self.delete_confirm_ttl_secs)
    }

    /// Reject settings the transport cannot work with.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;
        if self.timeout_secs == 0 {
            return Err(MonitorError::Config(
                "Request timeout must be at least one second.".into(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(MonitorError::Config("Page size must be positive.".into()));
        }
        Ok(())
    }
}

/// Only plain `http://` and `https://` base URLs are accepted.
fn validate_base_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            MonitorError::Config(format!(
                "Invalid API URL scheme: {url}\nExpected an http:// or https:// URL."
            ))
        })?;
    if rest.trim_matches('/').is_empty() {
        return Err(MonitorError::Config(format!("API URL has no host: {url}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.default_page_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let config = ClientConfig::default().with_base_url("ftp://example.com");
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn rejects_missing_host() {
        let config = ClientConfig::default().with_base_url("https:///");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = ClientConfig::default().with_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://monitor.example/api"}"#).unwrap();
        assert_eq!(config.base_url, "https://monitor.example/api");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.delete_confirm_ttl_secs, DEFAULT_DELETE_CONFIRM_TTL_SECS);
    }
}
