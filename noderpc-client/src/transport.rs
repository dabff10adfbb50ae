//! Moving request bytes to a node and response bytes back
//!
//! The dispatcher only ever sees the [`Transport`] trait. It hands over an
//! encoded request and gets back either the raw response body or a
//! [`TransportFault`]; library errors from reqwest or tungstenite never cross
//! this boundary.
//!
//! # Implementations
//!
//! - [`HttpTransport`](crate::HttpTransport): POST over HTTP(S)
//! - [`WsTransport`](crate::WsTransport): one text frame over WS(S)
//! - [`SchemeTransport`]: picks one of the above from the endpoint URL (default)
//!
//! Tests substitute their own implementation through
//! [`ClientBuilder::with_transport`](crate::ClientBuilder::with_transport).

use crate::config::Endpoint;
use crate::http::HttpTransport;
use crate::ws::WsTransport;
use async_trait::async_trait;
use noderpc_core::{FaultKind, Result, TransportFault};
use std::time::Duration;

/// Delivers one encoded request and returns the raw response body
///
/// One call is one attempt: implementations must send the body exactly once
/// and must not retry on their own. `timeout` bounds the whole exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `endpoint` and wait for the response body
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, TransportFault>;
}

/// Routes each endpoint to the HTTP or WebSocket transport by URL scheme
pub struct SchemeTransport {
    http: HttpTransport,
    ws: WsTransport,
}

impl SchemeTransport {
    /// Create both underlying transports
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new()?,
            ws: WsTransport::new(),
        })
    }
}

#[async_trait]
impl Transport for SchemeTransport {
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, TransportFault> {
        let scheme = endpoint.scheme();
        if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
            self.http.deliver(endpoint, body, timeout).await
        } else if scheme.eq_ignore_ascii_case("ws") || scheme.eq_ignore_ascii_case("wss") {
            self.ws.deliver(endpoint, body, timeout).await
        } else {
            Err(TransportFault::new(
                FaultKind::ConnectionRefused,
                format!("no transport for scheme `{}`", scheme),
            ))
        }
    }
}

/// Whether an error chain contains a TLS handshake or certificate failure
///
/// Both reqwest and tungstenite reach rustls through tokio-rustls, which
/// reports every rustls error as an `io::Error` of kind `InvalidData` carrying
/// the rustls error as its payload. Only that typed shape counts; error text
/// is never inspected, since it can include the request URL.
pub(crate) fn is_tls_error(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::InvalidData && io.get_ref().is_some() {
                return true;
            }
        }
        current = err.source();
    }
    false
}
