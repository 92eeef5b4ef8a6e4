//! JSON-RPC provider tests against a mock endpoint

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use web3sdk_provider::{
    ChainProvider, ConnectError, JsonRpcProvider, RpcClient, Throttle, TransportConfig,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn chain_server(chain_hex: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_chainId" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": chain_hex,
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_get_network_reports_endpoint_chain() {
    let server = chain_server("0x89").await;
    let provider = JsonRpcProvider::new(&server.uri(), 137).unwrap();

    let network = provider.get_network().await.unwrap();
    assert_eq!(network.chain_id, 137);
    assert_eq!(network.name, "matic");
}

#[tokio::test]
async fn test_get_network_detects_chain_mismatch() {
    let server = chain_server("0x1").await;
    let provider = JsonRpcProvider::new(&server.uri(), 137).unwrap();

    let err = provider.get_network().await.unwrap_err();
    assert!(matches!(err, ConnectError::ProviderUnreachable { .. }));
    assert!(err.to_string().contains("expected 137, got 1"));
}

#[tokio::test]
async fn test_rpc_error_keeps_method_and_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "method not found" },
        })))
        .mount(&server)
        .await;

    let provider = JsonRpcProvider::new(&server.uri(), 1).unwrap();
    let err = provider.request("eth_foo", json!([])).await.unwrap_err();
    match err {
        ConnectError::Rpc { method, code, .. } => {
            assert_eq!(method, "eth_foo");
            assert_eq!(code, -32601);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    // Nothing listens on port 9 on a test host.
    let provider = JsonRpcProvider::new("http://127.0.0.1:9/", 1).unwrap();
    let err = provider.get_network().await.unwrap_err();
    assert!(matches!(err, ConnectError::ProviderUnreachable { .. }));
}

#[tokio::test]
async fn test_throttle_spaces_requests() {
    let server = chain_server("0x1").await;
    let client = Arc::new(
        RpcClient::with_config(TransportConfig {
            throttle: Some(Throttle::with_burst(10, 1).unwrap()),
            ..Default::default()
        })
        .unwrap(),
    );
    // Two providers on one client draw from the same budget.
    let first = JsonRpcProvider::with_client(&server.uri(), 1, client.clone()).unwrap();
    let second = JsonRpcProvider::with_client(&server.uri(), 1, client.clone()).unwrap();

    let started = Instant::now();
    for provider in [&first, &second, &first, &second] {
        provider.get_network().await.unwrap();
    }
    // One immediate request, then one every 100ms.
    assert!(started.elapsed() >= Duration::from_millis(250), "{:?}", started.elapsed());
    assert_eq!(client.request_count(), 4);
}

#[tokio::test]
async fn test_request_timeout_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x1" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = RpcClient::with_config(TransportConfig {
        request_timeout: Some(Duration::from_millis(200)),
        ..Default::default()
    })
    .unwrap();
    let provider = JsonRpcProvider::with_client(&server.uri(), 1, Arc::new(client)).unwrap();

    let err = provider.get_network().await.unwrap_err();
    assert!(matches!(err, ConnectError::ProviderUnreachable { .. }));
}
