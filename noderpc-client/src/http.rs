//! HTTP(S) transport over reqwest

use crate::config::{Endpoint, TlsPolicy};
use crate::transport::{is_tls_error, Transport};
use async_trait::async_trait;
use noderpc_core::{Error, FaultKind, Result, TransportFault};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

const JSON_MIME: &str = "application/json";

/// POSTs each request body to the endpoint URL
///
/// Two reqwest clients are kept so the certificate policy can differ per
/// endpoint: one validates certificates, the other accepts invalid ones for
/// endpoints configured with [`TlsPolicy::AcceptInvalid`]. Both reuse pooled
/// connections per host.
#[derive(Clone)]
pub struct HttpTransport {
    verified: Client,
    accept_invalid: Client,
}

impl HttpTransport {
    /// Build the underlying reqwest clients
    ///
    /// # Errors
    ///
    /// `Error::Config` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let verified = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        let accept_invalid = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            verified,
            accept_invalid,
        })
    }

    fn client_for(&self, endpoint: &Endpoint) -> &Client {
        match endpoint.tls {
            TlsPolicy::Verified => &self.verified,
            TlsPolicy::AcceptInvalid => &self.accept_invalid,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, body), fields(url = %endpoint.url, bytes = body.len()))]
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, TransportFault> {
        let response = self
            .client_for(endpoint)
            .post(&endpoint.url)
            .header(CONTENT_TYPE, JSON_MIME)
            .header(ACCEPT, JSON_MIME)
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(&e, timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(&e, timeout))?;

        if !status.is_success() {
            // Nodes commonly attach a JSON-RPC error object to 4xx/5xx replies.
            if bytes.is_empty() {
                return Err(TransportFault::new(
                    FaultKind::Io,
                    format!("HTTP {} with empty body", status),
                ));
            }
            tracing::debug!(status = %status, "Non-success status with body, passing to codec");
        }

        Ok(bytes.to_vec())
    }
}

fn classify(error: &reqwest::Error, timeout: Duration) -> TransportFault {
    if error.is_timeout() {
        return TransportFault::timeout(timeout);
    }
    if is_tls_error(error) {
        return TransportFault::new(FaultKind::Tls, error.to_string());
    }
    if error.is_connect() {
        return TransportFault::new(FaultKind::ConnectionRefused, error.to_string());
    }
    TransportFault::new(FaultKind::Io, error.to_string())
}
