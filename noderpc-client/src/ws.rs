//! WebSocket transport over tokio-tungstenite
//!
//! Each attempt opens its own connection, sends the request as one text
//! frame, takes the first data frame that comes back as the response and
//! closes. Nothing is multiplexed, so the correlation rules are exactly the
//! same as over HTTP.
//!
//! Certificates of `wss://` endpoints are always verified against the
//! webpki roots; [`TlsPolicy::AcceptInvalid`](crate::TlsPolicy) only affects
//! HTTPS.

use crate::config::Endpoint;
use crate::transport::{is_tls_error, Transport};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use noderpc_core::{FaultKind, TransportFault};
use std::time::Duration;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{error::UrlError, Error as WsError, Message},
};

/// Sends each request over a fresh WebSocket connection
#[derive(Debug, Clone, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Create a WebSocket transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[tracing::instrument(skip(self, body), fields(url = %endpoint.url, bytes = body.len()))]
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportFault> {
        tokio::time::timeout(timeout, exchange(&endpoint.url, body))
            .await
            .map_err(|_| TransportFault::timeout(timeout))?
    }
}

async fn exchange(url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportFault> {
    let (mut stream, _) = connect_async(url).await.map_err(connect_fault)?;

    let text = String::from_utf8(body).map_err(|e| TransportFault::new(FaultKind::Io, e.to_string()))?;
    stream.send(Message::Text(text)).await.map_err(io_fault)?;

    loop {
        let reply = match stream.next().await {
            Some(Ok(Message::Text(text))) => text.into_bytes(),
            Some(Ok(Message::Binary(bytes))) => bytes,
            Some(Ok(Message::Close(_))) | None => {
                return Err(TransportFault::new(
                    FaultKind::Io,
                    "connection closed before a response arrived",
                ))
            }
            // ping/pong are answered by tungstenite itself
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(io_fault(e)),
        };

        if let Err(e) = stream.close(None).await {
            tracing::debug!(error = %e, "WebSocket close failed after response");
        }
        return Ok(reply);
    }
}

fn connect_fault(error: WsError) -> TransportFault {
    match &error {
        WsError::Url(UrlError::TlsFeatureNotEnabled) | WsError::Tls(_) => {
            TransportFault::new(FaultKind::Tls, error.to_string())
        }
        WsError::Protocol(_) | WsError::Http(_) => {
            TransportFault::new(FaultKind::ConnectionRefused, error.to_string())
        }
        _ if is_tls_error(&error) => TransportFault::new(FaultKind::Tls, error.to_string()),
        _ => TransportFault::new(FaultKind::ConnectionRefused, error.to_string()),
    }
}

fn io_fault(error: WsError) -> TransportFault {
    TransportFault::new(FaultKind::Io, error.to_string())
}
