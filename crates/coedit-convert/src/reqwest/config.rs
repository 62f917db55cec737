//! Reqwest client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default endpoint of the document service converter.
pub const DEFAULT_CONVERSION_URL: &str = "http://localhost:8080/converter";

/// Configuration for the document service HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Converter endpoint of the document service
    #[cfg_attr(
        feature = "config",
        arg(
            long = "conversion-url",
            env = "CONVERSION_URL",
            default_value = DEFAULT_CONVERSION_URL
        )
    )]
    #[serde(default = "default_conversion_url")]
    pub conversion_url: Url,

    /// Health endpoint of the document service (derived from the converter
    /// endpoint when unset)
    #[cfg_attr(
        feature = "config",
        arg(long = "conversion-health-url", env = "CONVERSION_HEALTH_URL")
    )]
    #[serde(default)]
    pub health_url: Option<Url>,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_conversion_url() -> Url {
    Url::parse(DEFAULT_CONVERSION_URL).expect("default conversion URL is valid")
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self::new(default_conversion_url())
    }
}

impl ReqwestConfig {
    /// Create a new configuration for the given converter endpoint.
    pub fn new(conversion_url: Url) -> Self {
        Self {
            conversion_url,
            health_url: None,
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("coedit/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Returns the health endpoint, `healthcheck` next to the converter
    /// path unless configured.
    pub fn effective_health_url(&self) -> Result<Url, url::ParseError> {
        match &self.health_url {
            Some(url) => Ok(url.clone()),
            None => self.conversion_url.join("healthcheck"),
        }
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the health endpoint.
    #[must_use]
    pub fn with_health_url(mut self, health_url: Url) -> Self {
        self.health_url = Some(health_url);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
