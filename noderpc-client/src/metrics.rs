//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by the dispatcher. They are created
//! when observability is enabled via `ClientBuilder::with_observability()`
//! and exported by whatever meter provider `init_observability` installed.
//!
//! # Metrics Collected
//!
//! - **noderpc.client.requests.total**: finished calls by method and outcome (counter)
//! - **noderpc.client.request.duration**: call latency in seconds, retries included (histogram)
//! - **noderpc.client.retries.total**: extra attempts after a retryable fault (counter)
//! - **noderpc.client.faults.total**: transport faults by kind, per attempt (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use noderpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("wallet-backend");
//! metrics.record_call("eth_blockNumber", "ok", 0.042);
//! ```

use noderpc_core::FaultKind;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instruments for one client
pub struct ClientMetrics {
    /// Finished calls
    pub requests_total: Counter<u64>,
    /// Call duration in seconds
    pub request_duration: Histogram<f64>,
    /// Retry attempts
    pub retries_total: Counter<u64>,
    /// Transport faults seen on individual attempts
    pub faults_total: Counter<u64>,
}

impl ClientMetrics {
    /// Create instruments on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let meter = global::meter_with_scope(
            opentelemetry::InstrumentationScope::builder(service_name.into()).build(),
        );
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a caller-provided meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("noderpc.client.requests.total")
                .with_description("Total number of finished calls")
                .build(),
            request_duration: meter
                .f64_histogram("noderpc.client.request.duration")
                .with_description("Call duration in seconds, including retries")
                .build(),
            retries_total: meter
                .u64_counter("noderpc.client.retries.total")
                .with_description("Total number of retry attempts")
                .build(),
            faults_total: meter
                .u64_counter("noderpc.client.faults.total")
                .with_description("Total number of transport faults per attempt")
                .build(),
        }
    }

    /// Record a finished call
    pub fn record_call(&self, method: &str, outcome: &'static str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("outcome", outcome),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record that another attempt is about to be made
    pub fn record_retry(&self, method: &str) {
        self.retries_total
            .add(1, &[KeyValue::new("method", method.to_string())]);
    }

    /// Record a transport fault on one attempt
    pub fn record_fault(&self, kind: FaultKind) {
        self.faults_total
            .add(1, &[KeyValue::new("kind", kind.as_str())]);
    }
}
