//! Core JSON-RPC 2.0 types and codec for noderpc
//!
//! This crate holds everything about a node call that does not involve a
//! network:
//!
//! - **Types**: request and response envelopes with their ids
//! - **Codec**: encoding requests and strictly validating responses
//! - **Outcome**: the single terminal result of a call
//! - **Error handling**: transport, codec and remote fault types
//! - **Observability**: tracing/metrics/log bootstrap for applications
//!
//! # Architecture
//!
//! The crate is transport-agnostic. `noderpc-client` builds the dispatcher,
//! the HTTP and WebSocket transports and the public client on top of it.
//!
//! # Example
//!
//! ```rust
//! use noderpc_core::{codec, CallOutcome, Id, RpcRequest};
//! use serde_json::json;
//!
//! let request = RpcRequest::new("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)], Id::Number(1));
//! let bytes = codec::encode_request(&request).unwrap();
//! assert!(bytes.starts_with(br#"{"jsonrpc":"2.0""#));
//!
//! let response = codec::decode_response(br#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x1b4"}}"#).unwrap();
//! let outcome = CallOutcome::from(response);
//! assert_eq!(outcome.result().unwrap()["number"], "0x1b4");
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod outcome;
pub mod types;

pub use error::{CodecFault, Error, FaultKind, JsonRpcErrorData, Result, TransportFault};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use outcome::CallOutcome;
pub use types::{Id, RpcRequest, RpcResponse, JSONRPC_VERSION};
