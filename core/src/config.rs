//! Connection settings shared by the services and synchronizers of one
//! backend.
//!
//! Settings can be deserialized from any serde source or read from the
//! environment:
//!
//! - `RESTSYNC_BASE_URL` (required)
//! - `RESTSYNC_POLL_INTERVAL_MS` (default 5000)
//! - `RESTSYNC_TIMEOUT_MS` (no timeout when unset)

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::transport::UreqTransport;

const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Headers sent with every request, e.g. `authorization`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            headers: BTreeMap::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: None,
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup("RESTSYNC_BASE_URL")
            .ok_or_else(|| ApiError::Config("RESTSYNC_BASE_URL is not set".to_string()))?;
        let mut config = Self::new(&base_url);
        if let Some(raw) = lookup("RESTSYNC_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_millis("RESTSYNC_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("RESTSYNC_TIMEOUT_MS") {
            config.timeout_ms = Some(parse_millis("RESTSYNC_TIMEOUT_MS", &raw)?);
        }
        Ok(config)
    }

    /// A client for `{base_url}/{resource}` carrying the configured headers.
    pub fn resource_client(&self, resource: &str) -> ResourceClient {
        self.headers
            .iter()
            .fold(ResourceClient::new(&self.base_url, resource), |client, (name, value)| {
                client.with_header(name.as_str(), value.as_str())
            })
    }

    pub fn transport(&self) -> UreqTransport {
        UreqTransport::with_timeout(self.timeout_ms.map(Duration::from_millis))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|e| ApiError::Config(format!("{key}={raw:?}: {e}")))
}
