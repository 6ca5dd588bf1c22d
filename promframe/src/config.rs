//! Client configuration.
//!
//! | Env var                          | Default                    |
//! |----------------------------------|----------------------------|
//! | `PROMETHEUS_URL`                 | `http://localhost:9090/`   |
//! | `PROMETHEUS_REQUEST_TIMEOUT`     | unset                      |
//! | `PROMETHEUS_CONNECT_TIMEOUT`     | unset                      |
//!
//! Timeouts are duration literals such as `30s`.

use std::time::Duration;

use crate::duration::parse_duration;
use crate::error::Result;

pub const DEFAULT_API_URL: &str = "http://localhost:9090/";

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the Prometheus server. API paths are joined onto it.
    pub api_url: String,
    /// Whole-request deadline. `None` leaves the request unbounded; the
    /// server-side `timeout` query parameter is the usual limit.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            request_timeout: None,
            connect_timeout: None,
            user_agent: None,
        }
    }

    /// Load from `PROMETHEUS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout = |key: &str| -> Result<Option<Duration>> {
            lookup(key)
                .map(|raw| parse_duration(&raw).map(Duration::from_secs))
                .transpose()
        };

        Ok(Self {
            api_url: lookup("PROMETHEUS_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout: timeout("PROMETHEUS_REQUEST_TIMEOUT")?,
            connect_timeout: timeout("PROMETHEUS_CONNECT_TIMEOUT")?,
            user_agent: None,
        })
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}
