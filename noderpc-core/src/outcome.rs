//! Terminal result of one client call
//!
//! Every call made through the client ends in exactly one `CallOutcome`. A
//! remote JSON-RPC error is data here, not a Rust error: the call completed and
//! the node answered, it just answered with an error object. Callers that prefer
//! `?` can use [`CallOutcome::into_result`].

use crate::error::{CodecFault, Error, JsonRpcErrorData, Result, TransportFault};
use crate::types::RpcResponse;
use std::fmt;

/// Outcome of a single call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The node returned a result
    Ok(serde_json::Value),
    /// The node returned a JSON-RPC error object
    RpcFault {
        /// Error code from the node
        code: i64,
        /// Error message from the node
        message: String,
        /// Optional error data from the node
        data: Option<serde_json::Value>,
    },
    /// The request could not be delivered or no answer arrived
    TransportFault(TransportFault),
    /// An answer arrived but was not a valid, correlated JSON-RPC response,
    /// or the caller's raw payload was not a valid request
    CodecFault(CodecFault),
}

impl CallOutcome {
    /// True for `CallOutcome::Ok`
    pub fn is_ok(&self) -> bool {
        matches!(self, CallOutcome::Ok(_))
    }

    /// The result value, if the call succeeded
    pub fn result(&self) -> Option<&serde_json::Value> {
        match self {
            CallOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// The transport fault, if the call ended in one
    pub fn transport_fault(&self) -> Option<&TransportFault> {
        match self {
            CallOutcome::TransportFault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            CallOutcome::Ok(_) => "ok",
            CallOutcome::RpcFault { .. } => "rpc_fault",
            CallOutcome::TransportFault(_) => "transport_fault",
            CallOutcome::CodecFault(_) => "codec_fault",
        }
    }

    /// Convert into a `Result`, turning every fault into an [`Error`]
    ///
    /// ```rust
    /// use noderpc_core::CallOutcome;
    /// use serde_json::json;
    ///
    /// let value = CallOutcome::Ok(json!("0x1b4")).into_result().unwrap();
    /// assert_eq!(value, json!("0x1b4"));
    /// ```
    pub fn into_result(self) -> Result<serde_json::Value> {
        match self {
            CallOutcome::Ok(value) => Ok(value),
            CallOutcome::RpcFault {
                code,
                message,
                data,
            } => Err(Error::Rpc(JsonRpcErrorData {
                code,
                message,
                data,
            })),
            CallOutcome::TransportFault(fault) => Err(Error::Transport(fault)),
            CallOutcome::CodecFault(fault) => Err(Error::Codec(fault)),
        }
    }
}

impl From<RpcResponse> for CallOutcome {
    fn from(response: RpcResponse) -> Self {
        match response {
            RpcResponse::Success { result, .. } => CallOutcome::Ok(result),
            RpcResponse::Error { error, .. } => CallOutcome::RpcFault {
                code: error.code,
                message: error.message,
                data: error.data,
            },
        }
    }
}

impl From<TransportFault> for CallOutcome {
    fn from(fault: TransportFault) -> Self {
        CallOutcome::TransportFault(fault)
    }
}

impl From<CodecFault> for CallOutcome {
    fn from(fault: CodecFault) -> Self {
        CallOutcome::CodecFault(fault)
    }
}

impl fmt::Display for CallOutcome {
    /// Text suitable for showing to a user: the result JSON on success,
    /// otherwise a one-line fault description.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Ok(value) => write!(f, "{}", value),
            CallOutcome::RpcFault { code, message, .. } => {
                write!(f, "RPC error [{}] {}", code, message)
            }
            CallOutcome::TransportFault(fault) => write!(f, "transport error ({})", fault),
            CallOutcome::CodecFault(fault) => write!(f, "invalid response ({})", fault),
        }
    }
}
