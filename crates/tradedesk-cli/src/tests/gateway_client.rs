// crates/tradedesk-cli/src/tests/gateway_client.rs
// ============================================================================
// Module: HTTP Gateway Client Tests
// Description: Request encoding and response mapping against a stub server.
// Purpose: Pin the wire behavior of the HTTP gateway client.
// Dependencies: tradedesk-cli gateway_client, tests::support
// ============================================================================

//! ## Overview
//! Each test starts a [`TestHttpServer`], issues one request through
//! [`HttpGateway`], and inspects both the captured request and the mapped
//! result.

use std::time::Duration;

use hyper::Method as HttpMethod;
use hyper::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tradedesk_config::GatewayConfig;
use tradedesk_core::ErrorKind;
use tradedesk_core::Failure;
use tradedesk_core::Gateway;
use tradedesk_core::GatewayError;
use tradedesk_core::GatewayRequest;
use tradedesk_core::Method;
use tradedesk_core::RequestBody;
use url::Url;

use super::support::TestHttpServer;
use super::support::TestResponse;
use crate::gateway_client::HttpGateway;
use crate::gateway_client::HttpGatewayConfig;
use crate::gateway_client::MAX_GATEWAY_RESPONSE_BYTES;
use crate::gateway_client::UnconfiguredGateway;
use crate::gateway_client::decode_payload;
use crate::gateway_client::remote_error;
use crate::gateway_client::status_category;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn client_for(base: &str, username: Option<&str>, password: Option<&str>) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig {
        base_url: Url::parse(base).unwrap(),
        username: username.map(str::to_string),
        password: password.map(str::to_string),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

// ============================================================================
// SECTION: Endpoint Construction
// ============================================================================

#[test]
fn endpoint_appends_path_to_base_path() {
    let client = client_for("http://gateway.local:1969/proxy/", None, None);
    let request = GatewayRequest::new(Method::Get, "/ibgrouter/gateways")
        .query("gateways", "ibg1")
        .query("gateways", "ibg 2");
    let url = client.endpoint(&request);
    assert_eq!(url.path(), "/proxy/ibgrouter/gateways");
    assert_eq!(url.query(), Some("gateways=ibg1&gateways=ibg+2"));
}

#[test]
fn endpoint_without_query_has_no_question_mark() {
    let client = client_for("http://gateway.local", None, None);
    let url = client.endpoint(&GatewayRequest::new(Method::Get, "/ping"));
    assert_eq!(url.as_str(), "http://gateway.local/ping");
}

#[test]
fn config_debug_redacts_password() {
    let config = HttpGatewayConfig {
        base_url: Url::parse("http://gateway.local").unwrap(),
        username: Some("trader".to_string()),
        password: Some("hunter2".to_string()),
        timeout: Duration::from_secs(1),
    };
    let rendered = format!("{config:?}");
    assert!(rendered.contains("trader"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn from_config_without_url_is_none() {
    assert!(HttpGatewayConfig::from_config(&GatewayConfig::default()).unwrap().is_none());
}

// ============================================================================
// SECTION: Request Encoding
// ============================================================================

#[tokio::test]
async fn get_sends_query_accept_and_basic_auth() {
    let server = TestHttpServer::start(|_| TestResponse::json(&json!({"ibg1": "running"}))).await;
    let client = client_for(&server.url(), Some("trader"), Some("secret"));

    let value = client
        .call(GatewayRequest::new(Method::Get, "/ibgrouter/gateways").query("status", "running"))
        .await
        .unwrap();
    assert_eq!(value, json!({"ibg1": "running"}));

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::GET);
    assert_eq!(request.path(), "/ibgrouter/gateways");
    assert_eq!(request.query_pairs(), vec![("status".to_string(), "running".to_string())]);
    assert_eq!(request.header("accept").as_deref(), Some("application/json"));
    let auth = request.header("authorization").unwrap();
    assert!(auth.starts_with("Basic "));
    server.shutdown().await;
}

#[tokio::test]
async fn form_body_is_url_encoded() {
    let server = TestHttpServer::start(|_| TestResponse::json(&json!({"status": "ok"}))).await;
    let client = client_for(&server.url(), None, None);

    let mut request = GatewayRequest::new(Method::Put, "/ibg1/credentials");
    request.body = RequestBody::Form(vec![
        ("username".to_string(), "trader".to_string()),
        ("password".to_string(), "p&ss word".to_string()),
    ]);
    client.call(request).await.unwrap();

    let requests = server.requests().await;
    let captured = &requests[0];
    assert_eq!(captured.method, HttpMethod::PUT);
    assert_eq!(
        captured.header("content-type").as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(captured.body_text(), "username=trader&password=p%26ss+word");
    assert!(captured.header("authorization").is_none());
    server.shutdown().await;
}

#[tokio::test]
async fn text_body_is_sent_verbatim() {
    let server = TestHttpServer::start(|_| TestResponse::raw(StatusCode::OK, "")).await;
    let client = client_for(&server.url(), None, None);

    let mut request = GatewayRequest::new(Method::Put, "/countdown/crontab");
    request.body = RequestBody::Text("0 9 * * mon-fri tradedesk ibg start\n".to_string());
    let value = client.call(request).await.unwrap();
    assert_eq!(value, serde_json::Value::Null);

    let requests = server.requests().await;
    assert_eq!(requests[0].body_text(), "0 9 * * mon-fri tradedesk ibg start\n");
    assert!(requests[0].header("content-type").unwrap().starts_with("text/plain"));
    server.shutdown().await;
}

#[tokio::test]
async fn json_body_sets_content_type() {
    let server = TestHttpServer::start(|_| TestResponse::json(&json!(true))).await;
    let client = client_for(&server.url(), None, None);

    let mut request = GatewayRequest::new(Method::Post, "/fundamental/reuters");
    request.body = RequestBody::Json(json!({"conids": [1, 2]}));
    client.call(request).await.unwrap();

    let requests = server.requests().await;
    assert_eq!(requests[0].header("content-type").as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({"conids": [1, 2]}));
    server.shutdown().await;
}

// ============================================================================
// SECTION: Response Mapping
// ============================================================================

#[tokio::test]
async fn client_error_maps_to_remote_with_message() {
    let server = TestHttpServer::start(|_| {
        TestResponse::json_status(StatusCode::BAD_REQUEST, &json!({"message": "no such gateway"}))
    })
    .await;
    let client = client_for(&server.url(), None, None);

    let err = client.call(GatewayRequest::new(Method::Get, "/ibg9/credentials")).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Remote {
            category: "bad_request".to_string(),
            message: "no such gateway".to_string(),
        }
    );
    let failure = Failure::from(err);
    assert_eq!(failure.kind, ErrorKind::GatewayError);
    assert_eq!(failure.message, "no such gateway");
    server.shutdown().await;
}

#[tokio::test]
async fn non_json_success_is_a_string() {
    let server = TestHttpServer::start(|_| TestResponse::raw(StatusCode::OK, "pong")).await;
    let client = client_for(&server.url(), None, None);
    let value = client.call(GatewayRequest::new(Method::Get, "/ping")).await.unwrap();
    assert_eq!(value, json!("pong"));
    server.shutdown().await;
}

#[tokio::test]
async fn oversized_response_is_a_protocol_error() {
    let body = vec![b'a'; MAX_GATEWAY_RESPONSE_BYTES + 1];
    let server = TestHttpServer::start(move |_| TestResponse::raw(StatusCode::OK, body.clone())).await;
    let client = client_for(&server.url(), None, None);
    let err = client.call(GatewayRequest::new(Method::Get, "/ping")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Protocol(_)), "unexpected error: {err:?}");
    server.shutdown().await;
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let server = TestHttpServer::start(|_| {
        let mut response = TestResponse::raw(StatusCode::FOUND, "");
        response.headers.insert(
            hyper::header::LOCATION,
            hyper::header::HeaderValue::from_static("http://127.0.0.1:9/elsewhere"),
        );
        response
    })
    .await;
    let client = client_for(&server.url(), None, None);
    let err = client.call(GatewayRequest::new(Method::Get, "/ping")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Remote { ref category, .. } if category == "http_302"));
    assert_eq!(server.requests().await.len(), 1);
    server.shutdown().await;
}

#[tokio::test]
async fn unreachable_gateway_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(&format!("http://{addr}"), None, None);
    let err = client.call(GatewayRequest::new(Method::Get, "/ping")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable(_)), "unexpected error: {err:?}");
    assert_eq!(err.kind(), ErrorKind::GatewayUnavailable);
}

#[tokio::test]
async fn unconfigured_gateway_always_fails() {
    let gateway = UnconfiguredGateway::new("set gateway.url".to_string());
    let err = gateway.call(GatewayRequest::new(Method::Get, "/ping")).await.unwrap_err();
    assert_eq!(err, GatewayError::NotConfigured("set gateway.url".to_string()));
    assert_eq!(Failure::from(err).exit_code(), 78);
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

#[test]
fn decode_payload_handles_empty_json_and_text() {
    assert_eq!(decode_payload(b""), serde_json::Value::Null);
    assert_eq!(decode_payload(b"  \n"), serde_json::Value::Null);
    assert_eq!(decode_payload(br#"{"a":1}"#), json!({"a": 1}));
    assert_eq!(decode_payload(b"plain text"), json!("plain text"));
}

#[test]
fn remote_error_prefers_body_category_then_msg() {
    let err = remote_error(409, br#"{"category":"already_running","msg":"ibg1 is running"}"#);
    assert_eq!(
        err,
        GatewayError::Remote {
            category: "already_running".to_string(),
            message: "ibg1 is running".to_string(),
        }
    );
}

#[test]
fn remote_error_falls_back_to_body_preview_and_status() {
    let long = "x".repeat(500);
    let GatewayError::Remote {
        category,
        message,
    } = remote_error(503, long.as_bytes())
    else {
        panic!("expected remote error");
    };
    assert_eq!(category, "server_error");
    assert_eq!(message.chars().count(), 240);

    let GatewayError::Remote {
        message, ..
    } = remote_error(404, b"")
    else {
        panic!("expected remote error");
    };
    assert_eq!(message, "http status 404");
}

#[test]
fn status_category_covers_common_codes() {
    assert_eq!(status_category(401), "unauthorized");
    assert_eq!(status_category(403), "forbidden");
    assert_eq!(status_category(404), "not_found");
    assert_eq!(status_category(502), "server_error");
    assert_eq!(status_category(418), "http_418");
}

proptest::proptest! {
    #[test]
    fn remote_error_preview_is_bounded(body in proptest::collection::vec(proptest::num::u8::ANY, 0 .. 2048), status in 400_u16 .. 600) {
        let GatewayError::Remote { category, message } = remote_error(status, &body) else {
            panic!("expected remote error");
        };
        proptest::prop_assert!(!category.is_empty());
        proptest::prop_assert!(!message.is_empty());
        if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
            proptest::prop_assert!(message.chars().count() <= 240);
        }
    }

    #[test]
    fn decode_payload_round_trips_json_text(text in "[a-z ]{1,40}") {
        let encoded = serde_json::to_vec(&text).unwrap();
        proptest::prop_assert_eq!(decode_payload(&encoded), json!(text));
    }
}
