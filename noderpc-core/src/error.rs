//! Error types for noderpc
//!
//! Failures are split by where they are detected:
//!
//! - **TransportFault**: the bytes never made it to the node or back
//!   (connection refused, timeout, TLS, I/O, cancellation)
//! - **CodecFault**: bytes came back but are not a valid, correlated JSON-RPC 2.0 response
//! - **JsonRpcErrorData**: the node answered with a well-formed JSON-RPC error object
//! - **Error**: the crate-level error that wraps all of the above plus configuration
//!   and serialization problems
//!
//! # Reserved Error Codes
//!
//! JSON-RPC 2.0 reserves these codes for `JsonRpcErrorData`:
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid request (missing required fields)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000 to -32099`: Server error (implementation-defined)
//!
//! # Examples
//!
//! ```rust
//! use noderpc_core::{FaultKind, JsonRpcErrorData, TransportFault};
//!
//! let fault = TransportFault::new(FaultKind::Timeout, "no response within 5000ms");
//! assert!(fault.is_retryable());
//!
//! let remote: JsonRpcErrorData =
//!     serde_json::from_str(r#"{"code":-32601,"message":"Method not found"}"#).unwrap();
//! assert_eq!(remote.code, -32601);
//! ```

use crate::types::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for noderpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
///
/// Returned from constructors and from `CallOutcome::into_result`. The client
/// itself never returns this from a call; calls always end in a `CallOutcome`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Invalid client configuration, detected at construction or reconfiguration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response (or caller payload) failed JSON-RPC validation
    #[error("Codec error: {0}")]
    Codec(#[from] CodecFault),

    /// Network-level failure talking to a node
    #[error("Transport error: {0}")]
    Transport(#[from] TransportFault),

    /// The node answered with a JSON-RPC error object
    #[error("JSON-RPC error: {0}")]
    Rpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization error outside the response envelope
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Telemetry pipeline could not be installed
    #[error("Observability error: {0}")]
    Observability(String),
}

/// Kind of a transport failure
///
/// Each kind is reported distinctly so the dispatcher can decide whether
/// another attempt has any chance of succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    /// The connection could not be established
    ConnectionRefused,
    /// No complete response arrived within the per-attempt timeout
    Timeout,
    /// TLS handshake or certificate validation failed
    Tls,
    /// Any other I/O failure after the connection was established
    Io,
    /// The caller cancelled the call
    Cancelled,
}

impl FaultKind {
    /// Whether a fresh attempt (possibly on another endpoint) may succeed.
    ///
    /// TLS failures are configuration problems and cancellation is a caller
    /// decision, so neither is retried.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FaultKind::ConnectionRefused | FaultKind::Timeout | FaultKind::Io
        )
    }

    /// Stable lowercase label, used for log fields and metric attributes
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::ConnectionRefused => "connection_refused",
            FaultKind::Timeout => "timeout",
            FaultKind::Tls => "tls",
            FaultKind::Io => "io",
            FaultKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport failure with a human-readable detail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct TransportFault {
    /// What went wrong
    pub kind: FaultKind,
    /// Free-form description from the underlying transport
    pub detail: String,
}

impl TransportFault {
    /// Create a fault of the given kind
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Fault reported when the caller cancels an in-flight call
    pub fn cancelled() -> Self {
        Self::new(FaultKind::Cancelled, "call cancelled by caller")
    }

    /// Fault reported when the per-attempt timeout elapses
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            FaultKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    /// See [`FaultKind::is_retryable`]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Validation failure of a JSON-RPC envelope
///
/// None of these are retried: a peer that sent malformed bytes once will
/// send them again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecFault {
    /// The bytes are not JSON, or not a JSON object
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// A required envelope field is absent
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// The response carries both `result` and `error`
    #[error("response carries both `result` and `error`")]
    BothResultAndError,

    /// The response id does not belong to the request that was sent
    #[error("response id {actual} does not match request id {expected}")]
    IdMismatch {
        /// Id of the request that was sent
        expected: Id,
        /// Id found in the response
        actual: Id,
    },

    /// A field is present but has the wrong type or value
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// JSON-RPC 2.0 error object as it appears on the wire
///
/// This is the `error` member of a response:
/// - `code`: integer error code
/// - `message`: short description
/// - `data`: optional extra information
///
/// # Examples
///
/// ```rust
/// use noderpc_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error: JsonRpcErrorData = serde_json::from_value(json!({
///     "code": -32000,
///     "message": "header not found",
///     "data": {"block": "0x1b4"}
/// }))
/// .unwrap();
/// assert_eq!(error.to_string(), "[-32000] header not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    ///
    /// Negative codes from -32768 to -32000 are reserved by JSON-RPC 2.0.
    pub code: i64,

    /// Human-readable error message
    pub message: String,

    /// Optional additional error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create a new JSON-RPC error with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}
