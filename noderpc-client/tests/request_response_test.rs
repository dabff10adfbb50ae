//! Request/response integration tests
//!
//! Calls against mock nodes over real HTTP and WebSocket connections:
//! results, node errors, malformed answers and raw payloads.

mod common;

use common::{mock_error_response, mock_response, MockHttpServer, MockReply, MockWsServer};
use noderpc_client::{CallOutcome, CodecFault, FaultKind, RpcClient};
use serde_json::json;
use std::time::Duration;

fn client_for(url: &str, max_retries: u32) -> RpcClient {
    RpcClient::builder()
        .endpoint(url)
        .timeout(Duration::from_secs(2))
        .max_retries(max_retries)
        .backoff(Duration::from_millis(10), Duration::from_millis(50))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_block_by_number() {
    let server = MockHttpServer::with_handler(|request| {
        if request["method"] == "eth_getBlockByNumber" && request["params"] == json!(["0x1b4", true]) {
            MockReply::Json(mock_response(request["id"].clone(), json!({"number": "0x1b4"})))
        } else {
            MockReply::Raw(500, String::new())
        }
    })
    .await;

    let client = client_for(&server.url(), 2);
    let outcome = client
        .send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)])
        .await;

    assert_eq!(outcome, CallOutcome::Ok(json!({"number": "0x1b4"})));
    assert_eq!(server.hits(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_request_headers_and_envelope() {
    let server = MockHttpServer::answering(json!("0x1")).await;
    let client = client_for(&server.url(), 0);

    client.send("eth_chainId", vec![]).await;

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(received[0].accept.as_deref(), Some("application/json"));
    assert_eq!(received[0].body["jsonrpc"], "2.0");
    assert_eq!(received[0].body["method"], "eth_chainId");
    assert_eq!(received[0].body["params"], json!([]));
    assert!(received[0].body["id"].is_i64());

    server.shutdown().await;
}

#[tokio::test]
async fn test_method_not_found_single_attempt() {
    let server = MockHttpServer::with_handler(|request| {
        MockReply::Json(mock_error_response(request["id"].clone(), -32601, "Method not found"))
    })
    .await;

    let client = client_for(&server.url(), 3);
    let outcome = client.send("eth_foo", vec![]).await;

    assert_eq!(
        outcome,
        CallOutcome::RpcFault {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        }
    );
    assert_eq!(server.hits(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_error_body_on_non_2xx_status() {
    let server = MockHttpServer::with_handler(|request| {
        MockReply::Raw(
            400,
            mock_error_response(request["id"].clone(), -32602, "invalid argument 0").to_string(),
        )
    })
    .await;

    let client = client_for(&server.url(), 0);
    let outcome = client.send("eth_getBalance", vec![json!("nope")]).await;

    assert!(matches!(outcome, CallOutcome::RpcFault { code: -32602, .. }));

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_non_2xx_is_io_fault() {
    let server = MockHttpServer::with_handler(|_| MockReply::Raw(503, String::new())).await;

    let client = client_for(&server.url(), 0);
    let outcome = client.send("eth_blockNumber", vec![]).await;

    assert_eq!(outcome.transport_fault().map(|f| f.kind), Some(FaultKind::Io));

    server.shutdown().await;
}

#[tokio::test]
async fn test_malformed_body_is_codec_fault_without_retry() {
    let server = MockHttpServer::with_handler(|_| MockReply::Raw(200, "<html>oops</html>".into())).await;

    let client = client_for(&server.url(), 3);
    let outcome = client.send("eth_blockNumber", vec![]).await;

    assert!(matches!(outcome, CallOutcome::CodecFault(CodecFault::MalformedJson(_))));
    assert_eq!(server.hits(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_id_is_mismatch() {
    let server = MockHttpServer::with_handler(|_| MockReply::Json(mock_response(json!(424242), json!("0x1")))).await;

    let client = client_for(&server.url(), 0);
    let outcome = client.send("eth_chainId", vec![]).await;

    assert!(matches!(outcome, CallOutcome::CodecFault(CodecFault::IdMismatch { .. })));

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_raw_payload() {
    let server = MockHttpServer::with_handler(|request| {
        MockReply::Json(mock_response(request["id"].clone(), request["params"].clone()))
    })
    .await;

    let client = client_for(&server.url(), 0);
    let outcome = client
        .send_raw(r#"{"jsonrpc":"2.0","method":"eth_getBlockByNumber","params":["0x1b4",true],"id":77}"#)
        .await;

    assert_eq!(outcome, CallOutcome::Ok(json!(["0x1b4", true])));
    let received = server.received();
    assert_ne!(received[0].body["id"], 77);

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_raw_rejects_bad_payload() {
    let server = MockHttpServer::answering(json!(null)).await;
    let client = client_for(&server.url(), 0);

    for payload in ["not json", "[1,2]", r#"{"method": 5}"#, r#"{"method":"x","params":{}}"#] {
        let outcome = client.send_raw(payload).await;
        assert!(
            matches!(outcome, CallOutcome::CodecFault(_)),
            "{} should be rejected, got {:?}",
            payload,
            outcome
        );
    }
    assert_eq!(server.hits(), 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_websocket_endpoint() {
    let server = MockWsServer::with_handler(|request| {
        Some(mock_response(request["id"].clone(), json!({"number": "0x1b4"})).to_string())
    })
    .await;

    let client = client_for(&server.url(), 0);
    let outcome = client
        .send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)])
        .await;

    assert_eq!(outcome, CallOutcome::Ok(json!({"number": "0x1b4"})));

    server.shutdown().await;
}

#[tokio::test]
async fn test_websocket_silence_times_out() {
    let server = MockWsServer::with_handler(|_| None).await;

    let client = RpcClient::builder()
        .endpoint(server.url())
        .timeout(Duration::from_millis(200))
        .max_retries(0)
        .build()
        .unwrap();
    let outcome = client.send("eth_blockNumber", vec![]).await;

    assert_eq!(outcome.transport_fault().map(|f| f.kind), Some(FaultKind::Timeout));

    server.shutdown().await;
}
