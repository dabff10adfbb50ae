//! Request dispatcher
//!
//! Drives one call from `(method, params)` to a [`CallOutcome`]:
//!
//! 1. **Pending**: take a fresh id from the counter and encode the request
//! 2. **Sent**: pick an endpoint and deliver under the per-attempt timeout
//! 3. **Decode**: validate the envelope and check the id belongs to us
//! 4. **Retry**: on a retryable transport fault, back off, move to the next
//!    endpoint and go back to 2 while attempts remain
//!
//! # Endpoint Selection
//!
//! A shared cursor points at the endpoint new calls start on. It starts at 0,
//! so the first call goes to the first endpoint. Every retry advances the
//! cursor, which means a failover sticks: once a node has been skipped, later
//! calls start on the node that replaced it.
//!
//! # Correlation
//!
//! The response id must equal the request id. The only exception is an
//! error response with a `null` id, which is what a node sends when it could
//! not read the request at all.

use crate::backoff::BackoffStrategy;
use crate::call::CancelSignal;
use crate::config::ClientConfig;
use crate::metrics::ClientMetrics;
use crate::transport::Transport;
use noderpc_core::{
    codec, CallOutcome, CodecFault, FaultKind, Id, RpcRequest, TransportFault,
};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Turns calls into outcomes over a [`Transport`]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    metrics: Option<Arc<ClientMetrics>>,
    next_id: AtomicI64,
    cursor: AtomicUsize,
}

impl Dispatcher {
    /// Create a dispatcher; backoff follows each call's config
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            backoff: None,
            metrics: None,
            next_id: AtomicI64::new(1),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Use `strategy` instead of the config's exponential backoff
    pub fn with_backoff(mut self, strategy: Arc<dyn BackoffStrategy>) -> Self {
        self.backoff = Some(strategy);
        self
    }

    /// Record metrics for every call
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Allocate the next request id
    pub fn next_id(&self) -> Id {
        Id::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Index of the endpoint the next call will start on
    pub fn cursor(&self, endpoint_count: usize) -> usize {
        if endpoint_count == 0 {
            return 0;
        }
        self.cursor.load(Ordering::Relaxed) % endpoint_count
    }

    /// Run one call to completion
    #[tracing::instrument(
        name = "rpc_call",
        skip(self, config, params, cancel),
        fields(method = %method, id = tracing::field::Empty, attempts = tracing::field::Empty)
    )]
    pub async fn call(
        &self,
        config: &ClientConfig,
        method: &str,
        params: Vec<serde_json::Value>,
        cancel: &CancelSignal,
    ) -> CallOutcome {
        let started = Instant::now();
        let outcome = self.run(config, method, params, cancel).await;
        let elapsed = started.elapsed();

        match &outcome {
            CallOutcome::Ok(_) => {
                tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "Call completed");
            }
            CallOutcome::RpcFault { code, message, .. } => {
                tracing::debug!(code, message = %message, "Node returned an error");
            }
            CallOutcome::TransportFault(fault) => {
                tracing::warn!(kind = %fault.kind, detail = %fault.detail, "Call failed");
            }
            CallOutcome::CodecFault(fault) => {
                tracing::warn!(error = %fault, "Invalid response");
            }
        }

        if let Some(ref m) = self.metrics {
            m.record_call(method, outcome.label(), elapsed.as_secs_f64());
        }

        outcome
    }

    async fn run(
        &self,
        config: &ClientConfig,
        method: &str,
        params: Vec<serde_json::Value>,
        cancel: &CancelSignal,
    ) -> CallOutcome {
        let id = self.next_id();
        let span = tracing::Span::current();
        span.record("id", tracing::field::display(&id));

        let request = RpcRequest::new(method, params, id.clone());
        let body = match codec::encode_request(&request) {
            Ok(body) => body,
            Err(e) => {
                return CallOutcome::CodecFault(CodecFault::InvalidField {
                    field: "params",
                    reason: e.to_string(),
                })
            }
        };

        let endpoints = &config.endpoints;
        if endpoints.is_empty() {
            return CallOutcome::TransportFault(TransportFault::new(
                FaultKind::ConnectionRefused,
                "no endpoints configured",
            ));
        }

        let timeout = config.timeout();
        let mut index = self.cursor(endpoints.len());
        let mut attempt: u32 = 0;

        loop {
            let endpoint = &endpoints[index];
            span.record("attempts", attempt + 1);
            tracing::debug!(attempt, url = %endpoint.url, "Sending request");

            let delivered = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return CallOutcome::TransportFault(TransportFault::cancelled());
                }
                result = tokio::time::timeout(
                    timeout,
                    self.transport.deliver(endpoint, body.clone(), timeout),
                ) => result.unwrap_or_else(|_| Err(TransportFault::timeout(timeout))),
            };

            let fault = match delivered {
                Ok(bytes) => return settle(&id, &bytes),
                Err(fault) => fault,
            };

            if let Some(ref m) = self.metrics {
                m.record_fault(fault.kind);
            }

            if !fault.is_retryable() || attempt >= config.max_retries {
                return CallOutcome::TransportFault(fault);
            }

            let delay = self.delay(config, attempt);
            tracing::info!(
                attempt,
                kind = %fault.kind,
                url = %endpoint.url,
                delay_ms = delay.as_millis() as u64,
                "Attempt failed, retrying"
            );
            if let Some(ref m) = self.metrics {
                m.record_retry(method);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return CallOutcome::TransportFault(TransportFault::cancelled());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
            index = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % endpoints.len();
        }
    }

    fn delay(&self, config: &ClientConfig, attempt: u32) -> Duration {
        match &self.backoff {
            Some(strategy) => strategy.delay(attempt),
            None => config.backoff().delay(attempt),
        }
    }
}

/// Decode a response body and check it answers request `id`
fn settle(id: &Id, bytes: &[u8]) -> CallOutcome {
    let response = match codec::decode_response(bytes) {
        Ok(response) => response,
        Err(fault) => return CallOutcome::CodecFault(fault),
    };

    let correlated = response.id() == id || (response.is_error() && response.id().is_null());
    if !correlated {
        return CallOutcome::CodecFault(CodecFault::IdMismatch {
            expected: id.clone(),
            actual: response.id().clone(),
        });
    }

    response.into()
}
