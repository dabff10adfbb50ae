//! Client builder for endpoints, timing and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring a client before
//! it is created. It allows you to:
//! - List node endpoints and their TLS policy
//! - Set the per-attempt timeout, retry count and backoff
//! - Swap in a custom backoff strategy or transport
//! - Configure observability (OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use noderpc_client::{ClientBuilder, Endpoint, ExponentialBackoff, TlsPolicy};
//! use std::time::Duration;
//!
//! # fn example() -> noderpc_core::Result<()> {
//! // Two nodes, failover between them
//! let client = ClientBuilder::new()
//!     .endpoint("https://mainnet.example.org")
//!     .endpoint(Endpoint::new("https://10.0.0.5:8545").with_tls(TlsPolicy::AcceptInvalid))
//!     .timeout(Duration::from_secs(3))
//!     .max_retries(3)
//!     .build()?;
//!
//! // With jittered backoff and observability
//! let client2 = ClientBuilder::new()
//!     .endpoint("wss://mainnet.example.org/ws")
//!     .with_backoff(ExponentialBackoff::default().with_jitter())
//!     .with_default_observability()
//!     .service_name("block-explorer")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::backoff::BackoffStrategy;
use crate::config::{ClientConfig, Endpoint};
use crate::dispatcher::Dispatcher;
use crate::transport::{SchemeTransport, Transport};
use crate::{ClientMetrics, RpcClient};
use noderpc_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an [`RpcClient`]
pub struct ClientBuilder {
    config: ClientConfig,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    transport: Option<Arc<dyn Transport>>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder with default timings and no endpoints
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            backoff: None,
            transport: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Append an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.config.endpoints.push(endpoint.into());
        self
    }

    /// Replace the endpoint list
    pub fn endpoints<I, E>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        self.config.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Extra attempts after a retryable fault
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Exponential backoff bounds
    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.config.backoff_base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        self.config.backoff_cap_ms = u64::try_from(cap.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Use a custom strategy instead of the configured exponential backoff
    pub fn with_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Some(Arc::new(strategy));
        self
    }

    /// Use a custom transport instead of the HTTP/WebSocket default
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Upper bound on concurrently running calls
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.config.max_in_flight = limit;
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Validate the configuration and create the client
    ///
    /// # Errors
    ///
    /// - `Error::Config` for an invalid configuration
    /// - `Error::Observability` if the telemetry pipeline cannot be installed
    pub fn build(self) -> Result<RpcClient> {
        self.config.validate()?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            noderpc_core::init_observability(config.clone()).map_err(|e| {
                Error::Observability(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else {
            None
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(SchemeTransport::new()?),
        };

        let mut dispatcher = Dispatcher::new(transport);
        if let Some(strategy) = self.backoff {
            dispatcher = dispatcher.with_backoff(strategy);
        }
        if let Some(metrics) = metrics {
            dispatcher = dispatcher.with_metrics(metrics);
        }

        tracing::info!(
            endpoints = self.config.endpoints.len(),
            timeout_ms = self.config.timeout_ms,
            max_retries = self.config.max_retries,
            max_in_flight = self.config.max_in_flight,
            "Client created"
        );

        Ok(RpcClient::from_parts(self.config, dispatcher))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
