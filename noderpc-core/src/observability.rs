//! Logging, tracing and metrics bootstrap
//!
//! The client crates only emit through the `tracing` macros and the global
//! OpenTelemetry meter. Nothing is collected or printed until an application
//! installs a pipeline with [`init_observability`]:
//!
//! - **Logs**: a JSON `fmt` layer filtered by `RUST_LOG` (or the configured level)
//! - **Traces**: spans exported over OTLP/gRPC through `tracing-opentelemetry`
//! - **Metrics**: an OTLP meter provider read every 30 seconds
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use noderpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("wallet-backend")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     noderpc_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... issue calls ...
//!
//!     noderpc_core::shutdown_observability().expect("Failed to flush telemetry");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log level filter (e.g., "info", "noderpc_client=debug")

use crate::error::{Error, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Providers handed to the OpenTelemetry globals, kept for shutdown
static TRACER_PROVIDER: Mutex<Option<SdkTracerProvider>> = Mutex::new(None);
static METER_PROVIDER: Mutex<Option<SdkMeterProvider>> = Mutex::new(None);

fn keep<T>(slot: &Mutex<Option<T>>, provider: T) {
    match slot.lock() {
        Ok(mut guard) => *guard = Some(provider),
        Err(poisoned) => *poisoned.into_inner() = Some(provider),
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "noderpc"
/// - Service version: Current crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT`, or "http://localhost:4317"
/// - Traces and metrics export disabled, local logs enabled
/// - Log level: `$RUST_LOG`, or "info"
///
/// Export is off by default because a client embedded in an app usually has
/// no collector next to it; turn it on with `with_traces(true)` /
/// `with_metrics(true)`.
///
/// # Examples
///
/// ```rust
/// use noderpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("block-explorer")
///     .with_endpoint("http://collector:4317")
///     .with_traces(true)
///     .with_log_level("debug");
/// assert!(config.enable_traces);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span and metric
    pub service_name: String,

    /// Service version attached to every span and metric
    pub service_version: String,

    /// OTLP/gRPC collector endpoint
    pub otlp_endpoint: String,

    /// Export spans to the collector
    pub enable_traces: bool,

    /// Export metrics to the collector
    pub enable_metrics: bool,

    /// Write JSON log lines to stdout
    pub enable_logs: bool,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "noderpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a new configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log level filter ("error", "warn", "info", "debug", "trace"
    /// or any `EnvFilter` directive)
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metrics export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Enable or disable local JSON logs
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the global subscriber and, if enabled, the OTLP providers
///
/// Call once at startup. A second call fails with `Error::Observability`
/// because the global subscriber is already set.
///
/// # Errors
///
/// - the OTLP exporters cannot be built (invalid endpoint)
/// - the log filter directive does not parse
/// - a global subscriber is already installed
pub fn init_observability(config: ObservabilityConfig) -> Result<()> {
    // The tracer has to exist before the subscriber is built, because the
    // OpenTelemetry layer wraps it.
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| Error::Observability(format!("span exporter: {}", e)))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());
    keep(&TRACER_PROVIDER, provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| Error::Observability(format!("metric exporter: {}", e)))?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    keep(&METER_PROVIDER, provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::Observability(format!("log filter: {}", e)))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Observability(e.to_string()))
}

/// Flush and stop telemetry export
///
/// Exports the spans still sitting in the batch processor and the metrics of
/// the current interval, then shuts both providers down. Call once before the
/// process exits; later calls find nothing to stop and return `Ok`.
///
/// # Errors
///
/// `Error::Observability` if either provider fails to flush.
pub fn shutdown_observability() -> Result<()> {
    tracing::info!("Shutting down observability");

    let mut failures = Vec::new();
    if let Some(provider) = take(&TRACER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            failures.push(format!("tracer provider: {}", e));
        }
    }
    if let Some(provider) = take(&METER_PROVIDER) {
        if let Err(e) = provider.shutdown() {
            failures.push(format!("meter provider: {}", e));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Observability(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "noderpc");
        assert!(!config.enable_traces);
        assert!(!config.enable_metrics);
        assert!(config.enable_logs);
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig::new("test-service")
            .with_endpoint("http://custom:4317")
            .with_log_level("debug")
            .with_version("1.0.0")
            .with_traces(true);

        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.otlp_endpoint, "http://custom:4317");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service_version, "1.0.0");
        assert!(config.enable_traces);
    }

    #[test]
    fn test_init_twice_fails_instead_of_panicking() {
        let config = ObservabilityConfig::new("test-none")
            .with_traces(false)
            .with_metrics(false)
            .with_logs(false)
            .with_log_level("warn");

        // Another test binary may already own the global subscriber, so only
        // the second call's result is asserted.
        let _ = init_observability(config.clone());
        assert!(matches!(
            init_observability(config),
            Err(Error::Observability(_))
        ));
    }

    #[test]
    fn test_shutdown_flushes_pending_metrics() {
        use opentelemetry::metrics::MeterProvider as _;
        use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader};

        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(
                PeriodicReader::builder(exporter.clone())
                    .with_interval(Duration::from_secs(3600))
                    .build(),
            )
            .build();
        keep(&METER_PROVIDER, provider.clone());

        provider
            .meter("shutdown-test")
            .u64_counter("noderpc.test.calls")
            .build()
            .add(1, &[]);
        assert!(exporter.get_finished_metrics().unwrap().is_empty());

        assert!(shutdown_observability().is_ok());

        let exported = exporter.get_finished_metrics().unwrap();
        let names: Vec<String> = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics())
            .flat_map(|sm| sm.metrics())
            .map(|m| m.name().to_string())
            .collect();
        assert!(names.contains(&"noderpc.test.calls".to_string()));

        // Nothing left to stop
        assert!(take(&METER_PROVIDER).is_none());
        assert!(shutdown_observability().is_ok());
    }
}
