//! Unit tests for the HTTP signing SDK transport
//!
//! Exercises the wire protocol against a mock signing service: request
//! shapes, success decoding, and the mapping of wallet error codes 4001
//! and 4902 into transport errors.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use txlink_wallet::{
    HttpSdkTransport, NetworkSpec, SdkTransport, TransportError, TxRequest, TxStatus,
};

const APP_ID: &str = "app-test-1";

async fn transport_for(server: &MockServer) -> HttpSdkTransport {
    HttpSdkTransport::new(&server.uri(), APP_ID, Duration::from_secs(2))
        .expect("client construction")
}

/// Test that load succeeds when the SDK manifest is served
/// What is tested: GET /v2/sdk/manifest happy path
/// Why: Load is the gate for every other operation
#[tokio::test]
async fn test_load_fetches_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/sdk/manifest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "2.3.1"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    transport.load().await.unwrap();
}

/// Test that an unserved manifest maps to Unreachable
/// What is tested: Load failure mapping
/// Why: The adapter's retry loop keys off this error
#[tokio::test]
async fn test_load_failure_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/sdk/manifest"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport.load().await.unwrap_err();
    assert!(matches!(err, TransportError::Unreachable(_)));
}

/// Test that connect sends the app ID and decodes the session body
/// What is tested: POST /v2/connect request and response shapes
/// Why: The session payload uses camelCase wire names
#[tokio::test]
async fn test_connect_decodes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/connect"))
        .and(body_json(json!({"appId": APP_ID})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "0x1111111111111111111111111111111111111111",
            "chainId": 11155111
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let session = transport.connect().await.unwrap();
    assert_eq!(
        session.address,
        "0x1111111111111111111111111111111111111111"
    );
    assert_eq!(session.chain_id, 11155111);
}

/// Test that a session body missing fields maps to Protocol
/// What is tested: Malformed response handling
/// Why: A decoding failure must not masquerade as a wallet error
#[tokio::test]
async fn test_connect_malformed_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "0xabc"})))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)));
}

/// Test that a missing session answers as None
/// What is tested: GET /v2/session 404 handling
/// Why: No session is a normal state, not an error
#[tokio::test]
async fn test_active_session_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/session"))
        .and(query_param("appId", APP_ID))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    assert!(transport.active_session().await.unwrap().is_none());
}

/// Test that error code 4902 maps to UnknownChain with the requested chain ID
/// What is tested: Unrecognized-chain error mapping
/// Why: The adapter's add-then-switch recovery keys off this variant
#[tokio::test]
async fn test_switch_unrecognized_chain_maps_to_unknown_chain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chain/switch"))
        .and(body_json(json!({"appId": APP_ID, "chainId": 11155111})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 4902,
            "message": "Unrecognized chain ID"
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport.switch_chain(11155111).await.unwrap_err();
    assert!(matches!(err, TransportError::UnknownChain(11155111)));
}

/// Test that add_chain sends the chain ID and RPC URL
/// What is tested: POST /v2/chain/add request shape
/// Why: Registration needs the RPC endpoint, not just the chain ID
#[tokio::test]
async fn test_add_chain_sends_rpc_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chain/add"))
        .and(body_json(json!({
            "appId": APP_ID,
            "chainId": 11155111,
            "rpcUrl": "https://rpc.sepolia.org"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    transport
        .add_chain(&NetworkSpec {
            chain_id: 11155111,
            rpc_url: "https://rpc.sepolia.org".to_string(),
        })
        .await
        .unwrap();
}

/// Test that error code 4001 maps to Rejected
/// What is tested: User-rejection error mapping
/// Why: Rejections are surfaced to the user verbatim, not as node errors
#[tokio::test]
async fn test_sign_rejection_maps_to_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 4001,
            "message": "User rejected the request"
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = TxRequest {
        to: "0xAbC0000000000000000000000000000000dEaD00".to_string(),
        data: "0xa9059cbb".to_string(),
        value: "0x0".to_string(),
    };
    let err = transport.sign_and_send(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected));
}

/// Test that a successful submission decodes hash and status
/// What is tested: POST /v2/transactions happy path, flattened body
/// Why: The transaction fields and app ID share one JSON object on the wire
#[tokio::test]
async fn test_sign_and_send_decodes_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(body_json(json!({
            "appId": APP_ID,
            "to": "0xAbC0000000000000000000000000000000dEaD00",
            "data": "0xa9059cbb",
            "value": "0x0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hash": "0xfeed000000000000000000000000000000000000000000000000000000000001",
            "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = TxRequest {
        to: "0xAbC0000000000000000000000000000000dEaD00".to_string(),
        data: "0xa9059cbb".to_string(),
        value: "0x0".to_string(),
    };
    let receipt = transport.sign_and_send(&request).await.unwrap();
    assert_eq!(receipt.status, TxStatus::Pending);
    assert!(receipt.hash.starts_with("0xfeed"));
}

/// Test that a structured error with an unknown code keeps code and message
/// What is tested: Generic wallet error mapping
/// Why: Unknown codes must stay diagnosable, not collapse to Unreachable
#[tokio::test]
async fn test_unknown_error_code_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chain/switch"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -32002,
            "message": "Request already pending"
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport.switch_chain(1).await.unwrap_err();
    match err {
        TransportError::Wallet { code, message } => {
            assert_eq!(code, -32002);
            assert!(message.contains("pending"));
        }
        other => panic!("expected wallet error, got {other:?}"),
    }
}
