//! noderpc - JSON-RPC 2.0 client for Ethereum-compatible nodes
//!
//! This is the main convenience crate that re-exports the noderpc sub-crates.
//!
//! # Architecture
//!
//! - **noderpc-core**: wire types, codec, call outcome, errors, observability
//! - **noderpc-client**: transports, dispatcher with retry and failover, `RpcClient`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use noderpc::{CallOutcome, RpcClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::builder()
//!         .endpoint("https://mainnet.example.org")
//!         .build()?;
//!
//!     match client.send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)]).await {
//!         CallOutcome::Ok(block) => println!("Block: {}", block),
//!         other => eprintln!("Call failed: {}", other),
//!     }
//!     Ok(())
//! }
//! ```

pub use noderpc_client as client;
pub use noderpc_core as core;

pub use noderpc_client::{
    ClientBuilder, ClientConfig, Endpoint, ExponentialBackoff, PendingCall, RpcClient, TlsPolicy,
};
pub use noderpc_core::{
    CallOutcome, CodecFault, Error, FaultKind, Id, ObservabilityConfig, Result, TransportFault,
};
