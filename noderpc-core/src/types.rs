//! JSON-RPC 2.0 types used by the node client
//!
//! This module implements the envelope types from the JSON-RPC 2.0 specification
//! (https://www.jsonrpc.org/specification) that a request/response client needs:
//!
//! - **Id**: correlates a response with the request that produced it
//! - **RpcRequest**: an outgoing call
//! - **RpcResponse**: a validated incoming answer, either a result or an error
//!
//! # Request IDs
//!
//! The client always assigns numeric ids from a counter. Responses may still
//! carry string ids (from misbehaving peers) or `null` (when the node could not
//! parse the request), so `Id` models all three.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version sent in every request and required in every response
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// This enum uses `#[serde(untagged)]` to serialize directly as the inner value
/// without a type discriminator, matching the JSON-RPC 2.0 spec exactly.
///
/// Numeric ids are `i64`, so an integer id survives a serialize/deserialize
/// round trip bit for bit, and a fractional id such as `1.5` is rejected instead
/// of being coerced.
///
/// # Examples
///
/// ```rust
/// use noderpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier - what the client generates
    Number(i64),
    /// String identifier
    String(String),
    /// Null identifier - only ever seen on error responses to unreadable requests
    Null,
}

impl Id {
    /// Whether this is the `null` id
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }
}

impl fmt::Display for Id {
    /// Strings are quoted, numbers are displayed as-is, null is "null"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

/// JSON-RPC 2.0 request message
///
/// Fields are declared in wire order so the encoded object always reads
/// `{"jsonrpc":"2.0","method":...,"params":[...],"id":...}`. Params are always
/// positional, which is what Ethereum nodes expect.
///
/// # Examples
///
/// ```rust
/// use noderpc_core::{Id, RpcRequest};
/// use serde_json::json;
///
/// let req = RpcRequest::new("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)], Id::Number(1));
/// assert_eq!(req.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version - always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method to invoke
    pub method: String,
    /// Positional parameters
    pub params: Vec<serde_json::Value>,
    /// Identifier to correlate this request with its response
    pub id: Id,
}

impl RpcRequest {
    /// Create a new JSON-RPC 2.0 request
    pub fn new(method: impl Into<String>, params: Vec<serde_json::Value>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A validated JSON-RPC 2.0 response
///
/// A response carries exactly one of `result` or `error`. The codec refuses
/// anything else, so by the time a value of this type exists the envelope is
/// known to be well-formed. Correlation with the request id is checked by
/// the dispatcher, which knows what it sent.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    /// The call succeeded
    Success {
        /// Id echoed by the node
        id: Id,
        /// Method result, any JSON value (including `null`)
        result: serde_json::Value,
    },
    /// The node reported an application-level error
    Error {
        /// Id echoed by the node, `Id::Null` if it could not read ours
        id: Id,
        /// Error object
        error: JsonRpcErrorData,
    },
}

impl RpcResponse {
    /// Id carried by the response
    pub fn id(&self) -> &Id {
        match self {
            RpcResponse::Success { id, .. } | RpcResponse::Error { id, .. } => id,
        }
    }

    /// Check if the response represents a successful result
    pub fn is_success(&self) -> bool {
        matches!(self, RpcResponse::Success { .. })
    }

    /// Check if the response represents an error
    pub fn is_error(&self) -> bool {
        matches!(self, RpcResponse::Error { .. })
    }
}
