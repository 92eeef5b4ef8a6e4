//! Mock JSON-RPC endpoints built on wiremock.

use serde_json::{json, Value};
use web3sdk_provider::to_hex_chain_id;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// JSON-RPC 2.0 success envelope
pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

/// JSON-RPC 2.0 error envelope
pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": code, "message": message },
    }))
}

/// Starts an endpoint answering `eth_chainId` with `chain_id`
pub async fn mock_chain_endpoint(chain_id: u64) -> MockServer {
    let server = MockServer::start().await;
    mount_chain_id(&server, chain_id).await;
    server
}

/// Mounts an `eth_chainId` responder on `server`
pub async fn mount_chain_id(server: &MockServer, chain_id: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_chainId" })))
        .respond_with(rpc_result(json!(to_hex_chain_id(chain_id))))
        .mount(server)
        .await;
}

/// Mounts an `eth_call` responder for calls to `to` whose calldata starts
/// with `selector`, returning `return_data` (hex, `0x`-prefixed).
pub async fn mount_eth_call(server: &MockServer, to: &str, selector: [u8; 4], return_data: &str) {
    let selector_hex = format!("0x{}", hex::encode(selector));
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .and(CallMatcher {
            to: to.to_lowercase(),
            selector: selector_hex,
        })
        .respond_with(rpc_result(json!(return_data)))
        .mount(server)
        .await;
}

struct CallMatcher {
    to: String,
    selector: String,
}

impl wiremock::Match for CallMatcher {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        let call = &body["params"][0];
        let to_matches = call["to"]
            .as_str()
            .is_some_and(|to| to.to_lowercase() == self.to);
        let data_matches = call["data"]
            .as_str()
            .or_else(|| call["input"].as_str())
            .is_some_and(|data| data.to_lowercase().starts_with(&self.selector));
        to_matches && data_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chain_endpoint_answers() {
        let server = mock_chain_endpoint(137).await;
        let body: Value = reqwest::Client::new()
            .post(server.uri())
            .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": [] }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["result"], json!("0x89"));
    }
}
