//! Client configuration
//!
//! A [`ClientConfig`] lists the node endpoints and the timing knobs for a
//! client. It can be built in code, deserialized from JSON (camelCase keys)
//! or read from `NODERPC_*` environment variables. A config is only accepted
//! by the client after [`ClientConfig::validate`] passes.
//!
//! ```json
//! {
//!   "endpoints": [
//!     "https://mainnet.example.org",
//!     { "url": "https://10.0.0.5:8545", "tls": "acceptInvalid" }
//!   ],
//!   "timeoutMs": 5000,
//!   "maxRetries": 2
//! }
//! ```

use crate::backoff::ExponentialBackoff;
use noderpc_core::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 100;
const DEFAULT_BACKOFF_CAP_MS: u64 = 5_000;
const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// How certificates presented by an endpoint are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TlsPolicy {
    /// Normal certificate and hostname validation
    #[default]
    Verified,
    /// Accept self-signed or otherwise invalid certificates
    AcceptInvalid,
}

/// A node address plus its TLS policy
///
/// Deserializes from either a bare URL string or `{ "url": ..., "tls": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EndpointRepr")]
pub struct Endpoint {
    /// Node URL (`http`, `https`, `ws` or `wss`)
    pub url: String,
    /// Certificate policy for `https`/`wss` URLs
    pub tls: TlsPolicy,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        tls: TlsPolicy,
    },
}

impl From<EndpointRepr> for Endpoint {
    fn from(repr: EndpointRepr) -> Self {
        match repr {
            EndpointRepr::Url(url) => Endpoint::new(url),
            EndpointRepr::Full { url, tls } => Endpoint { url, tls },
        }
    }
}

impl Endpoint {
    /// Endpoint with verified TLS
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tls: TlsPolicy::Verified,
        }
    }

    /// Set the TLS policy
    pub fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }

    /// URL scheme as written, without the `://`
    pub fn scheme(&self) -> &str {
        self.url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid endpoint URL `{}`: {}", self.url, e)))?;

        match parsed.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            other => {
                return Err(Error::Config(format!(
                    "unsupported scheme `{}` in endpoint `{}`",
                    other, self.url
                )))
            }
        }

        if parsed.host_str().is_none() {
            return Err(Error::Config(format!("endpoint `{}` has no host", self.url)));
        }

        Ok(())
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Endpoint::new(url)
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Endpoint::new(url)
    }
}

/// Endpoints and timing parameters for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Nodes to talk to, tried in round-robin order on failover
    pub endpoints: Vec<Endpoint>,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Extra attempts after the first one fails with a retryable fault
    pub max_retries: u32,
    /// First backoff delay in milliseconds
    pub backoff_base_ms: u64,
    /// Largest backoff delay in milliseconds
    pub backoff_cap_ms: u64,
    /// Upper bound on calls running at the same time
    pub max_in_flight: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl ClientConfig {
    /// Default timings with the given endpoints
    pub fn with_endpoints<I, E>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff strategy described by `backoffBaseMs`/`backoffCapMs`
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_cap_ms),
        )
    }

    /// Check every constraint a client relies on
    ///
    /// # Errors
    ///
    /// `Error::Config` naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(Error::Config("at least one endpoint is required".into()));
        }
        for endpoint in &self.endpoints {
            endpoint.check()?;
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeoutMs must be greater than 0".into()));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(Error::Config(format!(
                "backoffCapMs ({}) must not be below backoffBaseMs ({})",
                self.backoff_cap_ms, self.backoff_base_ms
            )));
        }
        if self.max_in_flight == 0 {
            return Err(Error::Config("maxInFlight must be greater than 0".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("invalid client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate the configuration from the environment
    ///
    /// - `NODERPC_ENDPOINTS`: comma separated URLs (required)
    /// - `NODERPC_TIMEOUT_MS`, `NODERPC_MAX_RETRIES`
    /// - `NODERPC_BACKOFF_BASE_MS`, `NODERPC_BACKOFF_CAP_MS`
    /// - `NODERPC_MAX_IN_FLIGHT`
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();

        if let Some(list) = lookup("NODERPC_ENDPOINTS") {
            config.endpoints = list
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(Endpoint::new)
                .collect();
        }
        if let Some(value) = lookup("NODERPC_TIMEOUT_MS") {
            config.timeout_ms = parse_var("NODERPC_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("NODERPC_MAX_RETRIES") {
            config.max_retries = parse_var("NODERPC_MAX_RETRIES", &value)?;
        }
        if let Some(value) = lookup("NODERPC_BACKOFF_BASE_MS") {
            config.backoff_base_ms = parse_var("NODERPC_BACKOFF_BASE_MS", &value)?;
        }
        if let Some(value) = lookup("NODERPC_BACKOFF_CAP_MS") {
            config.backoff_cap_ms = parse_var("NODERPC_BACKOFF_CAP_MS", &value)?;
        }
        if let Some(value) = lookup("NODERPC_MAX_IN_FLIGHT") {
            config.max_in_flight = parse_var("NODERPC_MAX_IN_FLIGHT", &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}={:?}: {}", key, value, e)))
}
