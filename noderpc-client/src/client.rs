//! JSON-RPC node client
//!
//! This module provides [`RpcClient`], the entry point applications use. It
//! owns the configuration, the dispatcher and the bound on concurrent calls,
//! and runs every call on a tokio worker task so the caller's task is never
//! blocked on the network.
//!
//! # Cloning
//!
//! `RpcClient` is cheaply cloneable using `Arc` internally. All clones share
//! the same id counter, endpoint cursor and in-flight bound.
//!
//! # Reconfiguration
//!
//! [`RpcClient::reconfigure`] swaps the configuration wholesale. Calls
//! already running keep the configuration they started with.

use crate::call::{cancel_pair, CancelSignal, PendingCall};
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::ClientBuilder;
use noderpc_core::{codec, CallOutcome, FaultKind, Result, TransportFault};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

/// Configuration plus the in-flight bound sized from it
struct Slot {
    config: Arc<ClientConfig>,
    permits: Arc<Semaphore>,
}

impl Slot {
    fn new(config: ClientConfig) -> Arc<Self> {
        let permits = Arc::new(Semaphore::new(config.max_in_flight));
        Arc::new(Self {
            config: Arc::new(config),
            permits,
        })
    }
}

struct ClientInner {
    dispatcher: Dispatcher,
    slot: RwLock<Arc<Slot>>,
}

impl ClientInner {
    async fn execute(&self, method: String, params: Vec<Value>, cancel: CancelSignal) -> CallOutcome {
        let slot = self.slot.read().await.clone();

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return CallOutcome::TransportFault(TransportFault::cancelled());
            }
            permit = slot.permits.clone().acquire_owned() => permit,
        };
        let _permit = match permit {
            Ok(permit) => permit,
            Err(e) => {
                return CallOutcome::TransportFault(TransportFault::new(FaultKind::Io, e.to_string()))
            }
        };

        self.dispatcher
            .call(&slot.config, &method, params, &cancel)
            .await
    }
}

/// JSON-RPC 2.0 client for Ethereum-compatible nodes
///
/// # Examples
///
/// ```rust,no_run
/// use noderpc_client::RpcClient;
/// use serde_json::json;
///
/// # async fn example() -> noderpc_core::Result<()> {
/// let client = RpcClient::builder()
///     .endpoint("https://mainnet.example.org")
///     .build()?;
///
/// let outcome = client
///     .send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)])
///     .await;
/// println!("{}", outcome);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<ClientInner>,
}

impl RpcClient {
    /// Create a client with the default transport
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration does not validate.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Start building a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Assemble a client from a validated config and a ready dispatcher
    pub(crate) fn from_parts(config: ClientConfig, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher,
                slot: RwLock::new(Slot::new(config)),
            }),
        }
    }

    /// Call `method` with positional `params` and wait for the outcome
    ///
    /// Dropping the returned future cancels the call.
    pub async fn send(&self, method: impl Into<String>, params: Vec<Value>) -> CallOutcome {
        self.submit(method, params).await
    }

    /// Send a complete JSON-RPC payload typed by a user
    ///
    /// The payload must be an object with a string `method` and, optionally,
    /// an array `params`. Any `id` in it is replaced by a fresh one. A payload
    /// that does not qualify ends in `CallOutcome::CodecFault` without
    /// touching the network.
    pub async fn send_raw(&self, payload: &str) -> CallOutcome {
        self.submit_raw(payload).await
    }

    /// Start a call on the worker pool and return a cancellable handle
    ///
    /// Dropping the handle cancels the call; use
    /// [`PendingCall::detach`] to let it finish unobserved. Must be called
    /// from within a tokio runtime.
    pub fn submit(&self, method: impl Into<String>, params: Vec<Value>) -> PendingCall {
        let method = method.into();
        let (handle, signal) = cancel_pair();
        let inner = self.inner.clone();

        let task = tokio::spawn(async move { inner.execute(method, params, signal).await });
        PendingCall::running(task, handle)
    }

    /// [`submit`](Self::submit) for a raw payload
    pub fn submit_raw(&self, payload: &str) -> PendingCall {
        match codec::parse_call_payload(payload) {
            Ok((method, params)) => self.submit(method, params),
            Err(fault) => {
                tracing::debug!(error = %fault, "Rejected raw payload");
                PendingCall::ready(CallOutcome::CodecFault(fault))
            }
        }
    }

    /// Replace the configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if `config` does not validate; the old configuration
    /// stays in effect.
    pub async fn reconfigure(&self, config: ClientConfig) -> Result<()> {
        config.validate()?;
        tracing::info!(
            endpoints = config.endpoints.len(),
            timeout_ms = config.timeout_ms,
            max_retries = config.max_retries,
            "Client reconfigured"
        );
        *self.inner.slot.write().await = Slot::new(config);
        Ok(())
    }

    /// Snapshot of the current configuration
    pub async fn config(&self) -> ClientConfig {
        self.inner.slot.read().await.config.as_ref().clone()
    }
}
