//! Codec for JSON-RPC message serialization and validation
//!
//! Encoding is plain serde. Decoding is stricter than a derived `Deserialize`
//! would be: the response envelope is inspected field by field so that every
//! way a node can get it wrong maps to a distinct [`CodecFault`]:
//!
//! - not JSON, or not an object → `MalformedJson`
//! - no `jsonrpc` / no `id` / neither `result` nor `error` → `MissingField`
//! - both `result` and `error` → `BothResultAndError`
//! - wrong version, fractional id, malformed error object → `InvalidField`
//!
//! The same module parses payloads typed by a user (`parse_call_payload`) and
//! turns command-line words into params (`coerce_arg`).
//!
//! # Examples
//!
//! ```rust
//! use noderpc_core::{codec, Id, RpcResponse};
//! use serde_json::json;
//!
//! let bytes = codec::encode("eth_blockNumber", vec![], Id::Number(1)).unwrap();
//! assert_eq!(bytes, br#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#);
//!
//! let response = codec::decode_response(br#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#).unwrap();
//! assert_eq!(response, RpcResponse::Success { id: Id::Number(1), result: json!("0x10") });
//! ```

use crate::error::{CodecFault, Error, JsonRpcErrorData, Result};
use crate::types::{Id, RpcRequest, RpcResponse, JSONRPC_VERSION};
use serde_json::{Map, Value};

/// Encode a request to its wire bytes
///
/// # Errors
///
/// Returns `Error::Serialization` if the params contain something serde_json
/// refuses to write (in practice only non-string map keys, which `Value` cannot
/// hold, so this does not fail for requests built from `Value` params).
pub fn encode_request(request: &RpcRequest) -> Result<Vec<u8>> {
    serde_json::to_vec(request).map_err(|e| Error::Serialization(e.to_string()))
}

/// Build and encode a request in one step
pub fn encode(method: &str, params: Vec<Value>, id: Id) -> Result<Vec<u8>> {
    encode_request(&RpcRequest::new(method, params, id))
}

/// Decode and validate a response envelope
///
/// This checks shape only. Whether the id matches the request that was sent is
/// the caller's concern, since the codec does not know what was sent.
pub fn decode_response(data: &[u8]) -> std::result::Result<RpcResponse, CodecFault> {
    let value: Value =
        serde_json::from_slice(data).map_err(|e| CodecFault::MalformedJson(e.to_string()))?;

    let mut envelope = match value {
        Value::Object(map) => map,
        other => {
            return Err(CodecFault::MalformedJson(format!(
                "expected a response object, got {}",
                json_type_name(&other)
            )))
        }
    };

    check_version(&envelope)?;

    let id = match envelope.remove("id") {
        Some(raw) => parse_id(raw)?,
        None => return Err(CodecFault::MissingField("id")),
    };

    // A field that is present with value `null` still counts as present for
    // `result` (a method may legitimately return null) but not for `error`,
    // which some nodes emit as `"error": null` next to a real result.
    let result = envelope.remove("result");
    let error = envelope.remove("error").filter(|e| !e.is_null());

    match (result, error) {
        (Some(_), Some(_)) => Err(CodecFault::BothResultAndError),
        (Some(result), None) => Ok(RpcResponse::Success { id, result }),
        (None, Some(error)) => {
            let error: JsonRpcErrorData =
                serde_json::from_value(error).map_err(|e| CodecFault::InvalidField {
                    field: "error",
                    reason: e.to_string(),
                })?;
            Ok(RpcResponse::Error { id, error })
        }
        (None, None) => Err(CodecFault::MissingField("result")),
    }
}

/// Parse a complete request payload typed by a caller
///
/// Returns the method and positional params. The caller's `id`, if any, is
/// dropped: the dispatcher assigns its own so that ids stay unique.
///
/// Accepted:
/// - `method` (required, string)
/// - `params` (optional, array; defaults to `[]`)
/// - `jsonrpc` (optional, must be `"2.0"` when present)
///
/// ```rust
/// use noderpc_core::codec;
/// use serde_json::json;
///
/// let (method, params) = codec::parse_call_payload(
///     r#"{"jsonrpc":"2.0","method":"eth_getBlockByNumber","params":["0x1b4", true],"id":1}"#,
/// ).unwrap();
/// assert_eq!(method, "eth_getBlockByNumber");
/// assert_eq!(params, vec![json!("0x1b4"), json!(true)]);
/// ```
pub fn parse_call_payload(payload: &str) -> std::result::Result<(String, Vec<Value>), CodecFault> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| CodecFault::MalformedJson(e.to_string()))?;

    let mut envelope = match value {
        Value::Object(map) => map,
        other => {
            return Err(CodecFault::MalformedJson(format!(
                "expected a request object, got {}",
                json_type_name(&other)
            )))
        }
    };

    if envelope.contains_key("jsonrpc") {
        check_version(&envelope)?;
    }

    let method = match envelope.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        Some(Value::String(_)) => {
            return Err(CodecFault::InvalidField {
                field: "method",
                reason: "must not be empty".to_string(),
            })
        }
        Some(other) => {
            return Err(CodecFault::InvalidField {
                field: "method",
                reason: format!("expected string, got {}", json_type_name(&other)),
            })
        }
        None => return Err(CodecFault::MissingField("method")),
    };

    let params = match envelope.remove("params") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(params)) => params,
        Some(other) => {
            return Err(CodecFault::InvalidField {
                field: "params",
                reason: format!("expected array, got {}", json_type_name(&other)),
            })
        }
    };

    Ok((method, params))
}

/// Turn one command-line word into a JSON param
///
/// - text that parses as a JSON object or array is used as-is
/// - `true`, `false` and `null` become JSON literals
/// - everything else is a string, so quantities like `0x1b4` stay hex strings
///
/// ```rust
/// use noderpc_core::codec::coerce_arg;
/// use serde_json::json;
///
/// assert_eq!(coerce_arg("0x1b4"), json!("0x1b4"));
/// assert_eq!(coerce_arg("true"), json!(true));
/// assert_eq!(coerce_arg(r#"{"to":"0x0"}"#), json!({"to": "0x0"}));
/// ```
pub fn coerce_arg(arg: &str) -> Value {
    let trimmed = arg.trim();
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }

    Value::String(arg.to_string())
}

fn check_version(envelope: &Map<String, Value>) -> std::result::Result<(), CodecFault> {
    match envelope.get("jsonrpc") {
        Some(Value::String(v)) if v == JSONRPC_VERSION => Ok(()),
        Some(other) => Err(CodecFault::InvalidField {
            field: "jsonrpc",
            reason: format!("expected \"2.0\", got {}", other),
        }),
        None => Err(CodecFault::MissingField("jsonrpc")),
    }
}

fn parse_id(raw: Value) -> std::result::Result<Id, CodecFault> {
    match raw {
        Value::Number(ref n) => n.as_i64().map(Id::Number).ok_or_else(|| CodecFault::InvalidField {
            field: "id",
            reason: format!("{} is not a 64-bit integer", n),
        }),
        Value::String(s) => Ok(Id::String(s)),
        Value::Null => Ok(Id::Null),
        other => Err(CodecFault::InvalidField {
            field: "id",
            reason: format!("expected number, string or null, got {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
