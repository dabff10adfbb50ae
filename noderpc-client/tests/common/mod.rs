//! Common test utilities for noderpc-client integration tests
//!
//! This module provides mock nodes and helpers for testing client behavior
//! without a real Ethereum node:
//!
//! - `MockHttpServer`: a warp server answering JSON-RPC POSTs
//! - `MockWsServer`: a WebSocket server answering text frames
//! - `ScriptedTransport`: an in-memory transport following a script

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use noderpc_client::{Endpoint, FaultKind, Transport, TransportFault};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use warp::Filter;

/// What the mock HTTP node sends back for one request
pub enum MockReply {
    /// 200 with a JSON body
    Json(Value),
    /// Wait, then 200 with a JSON body
    Delayed(Duration, Value),
    /// Arbitrary status and body text
    Raw(u16, String),
}

/// One request as seen by the mock HTTP node
#[derive(Debug, Clone)]
pub struct Received {
    pub body: Value,
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

/// Mock JSON-RPC node over HTTP
pub struct MockHttpServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockHttpServer {
    /// Start a node that answers every request with the handler's reply
    ///
    /// The handler receives the parsed request body, so it can echo the id.
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> MockReply + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let received = Arc::new(Mutex::new(Vec::new()));

        let route = warp::post()
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then({
                let received = received.clone();
                move |headers: warp::http::HeaderMap, body: warp::hyper::body::Bytes| {
                    let handler = handler.clone();
                    let received = received.clone();
                    async move {
                        let parsed: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                        let header = |name: &str| {
                            headers
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        received.lock().unwrap().push(Received {
                            body: parsed.clone(),
                            content_type: header("content-type"),
                            accept: header("accept"),
                        });

                        let (status, text) = match handler(&parsed) {
                            MockReply::Json(value) => (200, value.to_string()),
                            MockReply::Delayed(delay, value) => {
                                tokio::time::sleep(delay).await;
                                (200, value.to_string())
                            }
                            MockReply::Raw(status, text) => (status, text),
                        };

                        let response = warp::http::Response::builder()
                            .status(status)
                            .header("content-type", "application/json")
                            .body(warp::hyper::Body::from(text))
                            .unwrap();
                        Ok::<_, warp::Rejection>(response)
                    }
                }
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(route)
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            received,
        }
    }

    /// A node that echoes the request id with a fixed result
    pub async fn answering(result: Value) -> Self {
        Self::with_handler(move |request| {
            MockReply::Json(mock_response(request["id"].clone(), result.clone()))
        })
        .await
    }

    /// HTTP URL of this node
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    /// Number of requests received so far
    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Shutdown the mock server
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Mock JSON-RPC node over WebSocket
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
}

impl MockWsServer {
    /// Start a server that answers each text frame with the handler's reply
    ///
    /// Returning `None` leaves the frame unanswered.
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = Arc::new(handler);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let handler = handler.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            while let Some(Ok(msg)) = read.next().await {
                                if let Message::Text(text) = msg {
                                    let request: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
                                    if let Some(reply) = handler(&request) {
                                        let _ = write.send(Message::Text(reply)).await;
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self { addr, shutdown_tx }
    }

    /// WebSocket URL of this node
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Shutdown the mock server
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// A URL on localhost where nothing is listening
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// What the scripted transport does on one attempt
pub enum Step {
    /// Answer with this result and the request's own id
    Echo(Value),
    /// Answer with these exact bytes
    Raw(String),
    /// Fail with a transport fault of this kind
    Fault(FaultKind),
    /// Never answer
    Hang,
}

/// In-memory transport that replays a script, one step per attempt
///
/// When the script runs out every further attempt echoes `null`.
#[derive(Clone)]
pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait this long before answering each attempt
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Endpoint URL and parsed body of every attempt so far
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of attempts that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, TransportFault> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let request: Value = serde_json::from_slice(&body).unwrap();
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.url.clone(), request.clone()));

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Echo(Value::Null));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Step::Echo(result) => Ok(mock_response(request["id"].clone(), result)
                .to_string()
                .into_bytes()),
            Step::Raw(text) => Ok(text.into_bytes()),
            Step::Fault(kind) => Err(TransportFault::new(kind, "scripted fault")),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Helper to create a mock JSON-RPC response
pub fn mock_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Helper to create a mock JSON-RPC error response
pub fn mock_error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}
