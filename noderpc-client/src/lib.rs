//! JSON-RPC 2.0 client for Ethereum-compatible nodes
//!
//! This crate sends JSON-RPC requests to one of several configured nodes and
//! turns whatever happens into exactly one [`CallOutcome`]. It handles
//! per-attempt timeouts, retries with backoff, endpoint failover, response
//! validation and cancellation.
//!
//! # Core Features
//!
//! - **HTTP and WebSocket transports**: chosen per endpoint from the URL scheme
//! - **Retry and failover**: retryable faults move on to the next endpoint
//! - **Strict responses**: malformed or uncorrelated answers are reported, never guessed at
//! - **Worker pool**: calls run on tokio tasks, bounded by `maxInFlight`
//! - **Cancellation**: every submitted call can be cancelled
//! - **Observability**: tracing spans per call and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use noderpc_client::RpcClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::builder()
//!         .endpoint("https://mainnet.example.org")
//!         .endpoint("https://backup.example.org")
//!         .build()?;
//!
//!     // Structured call
//!     let block = client
//!         .send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)])
//!         .await
//!         .into_result()?;
//!     println!("Block: {}", block);
//!
//!     // Payload typed by a user
//!     let outcome = client
//!         .send_raw(r#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#)
//!         .await;
//!     println!("{}", outcome);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation
//!
//! ```rust,no_run
//! use noderpc_client::RpcClient;
//!
//! # async fn example(client: RpcClient) {
//! let call = client.submit("eth_syncing", vec![]);
//! call.cancel();
//! let outcome = call.await; // TransportFault { kind: Cancelled }
//! # }
//! ```

mod backoff;
mod call;
mod client;
mod client_builder;
mod config;
mod dispatcher;
mod http;
mod metrics;
mod transport;
mod ws;

pub use backoff::{BackoffStrategy, ExponentialBackoff, FixedDelay};
pub use call::{cancel_pair, CancelHandle, CancelSignal, PendingCall};
pub use client::RpcClient;
pub use client_builder::ClientBuilder;
pub use config::{ClientConfig, Endpoint, TlsPolicy};
pub use dispatcher::Dispatcher;
pub use http::HttpTransport;
pub use metrics::ClientMetrics;
pub use noderpc_core::{CallOutcome, CodecFault, FaultKind, TransportFault};
pub use transport::{SchemeTransport, Transport};
pub use ws::WsTransport;
