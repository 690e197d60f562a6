//! Gateway invocations against the demo application.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use switchyard::gateway::{GatewayError, GatewayResponse};
use switchyard::{app, GatewayHandler};

mod common;

fn handler() -> GatewayHandler {
    GatewayHandler::new(Arc::new(app::build_engine().unwrap()))
}

fn invoke(event: &Value) -> GatewayResponse {
    let output = handler().invoke(&common::to_payload(event)).unwrap();
    serde_json::from_slice(&output).unwrap()
}

fn body_json(response: &GatewayResponse) -> Value {
    assert!(!response.is_base64_encoded);
    serde_json::from_str(&response.body).unwrap()
}

#[test]
fn test_root_per_method() {
    let get = invoke(&common::gateway_event("GET", "/"));
    assert_eq!(get.status_code, 200);
    assert_eq!(body_json(&get), json!({"hello": "world"}));
    assert_eq!(get.headers["content-type"], "application/json; charset=UTF-8");
    assert_eq!(get.headers["server"], "switchyard");

    let post = invoke(&common::gateway_event("POST", "/"));
    assert_eq!(body_json(&post), json!({"hello": "world post"}));

    // No PUT entry: falls back to the "any" entry.
    let put = invoke(&common::gateway_event("PUT", "/"));
    assert_eq!(body_json(&put), json!({"hello": "world any"}));
}

#[test]
fn test_literal_and_greedy() {
    let tt = invoke(&common::gateway_event("GET", "/tt"));
    assert_eq!(body_json(&tt), json!({"hello tt": "world get"}));

    let greedy = invoke(&common::gateway_event("GET", "/a/b/c"));
    assert_eq!(body_json(&greedy), json!({"hello": "a/b/c"}));

    // "/users" has no route of its own; the root greedy wildcard takes it.
    let users = invoke(&common::gateway_event("GET", "/users"));
    assert_eq!(body_json(&users), json!({"hello": "users"}));
}

#[test]
fn test_not_found() {
    let response = invoke(&common::gateway_event("POST", "/tt"));
    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, r#"{"message":"Not Found"}"#);
    assert!(!response.is_base64_encoded);
    assert_eq!(response.headers["content-type"], "application/json; charset=UTF-8");
    // Not-found runs outside the global middleware.
    assert!(!response.headers.contains_key("server"));
}

#[test]
fn test_cookies_in_and_out() {
    let mut event = common::gateway_event("GET", "/users/42");
    event["cookies"] = json!(["visits=2", "theme=dark"]);

    let response = invoke(&event);
    assert_eq!(body_json(&response), json!({"id": "42", "visits": 3}));
    assert_eq!(response.cookies, vec!["visits=3; Path=/; HttpOnly; SameSite=Lax"]);
    assert!(!response.headers.contains_key("set-cookie"));
}

#[test]
fn test_base64_request_body_echo() {
    let mut event = common::gateway_event("POST", "/echo");
    event["headers"] = json!({"content-type": "application/json"});
    event["body"] = json!(STANDARD.encode(br#"{"ping":1}"#));
    event["isBase64Encoded"] = json!(true);

    let response = invoke(&event);
    assert_eq!(response.status_code, 200);
    assert!(!response.is_base64_encoded);
    assert_eq!(response.body, r#"{"ping":1}"#);
}

#[test]
fn test_binary_response() {
    let response = invoke(&common::gateway_event("GET", "/pixel.png"));
    assert_eq!(response.headers["content-type"], "image/png");
    assert!(response.is_base64_encoded);
    let bytes = STANDARD.decode(&response.body).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_route_middleware_and_error_handler() {
    let denied = invoke(&common::gateway_event("DELETE", "/users/9"));
    assert_eq!(denied.status_code, 401);
    assert_eq!(body_json(&denied), json!({"message": "missing api key"}));

    let mut event = common::gateway_event("DELETE", "/users/9");
    event["headers"] = json!({"x-api-key": "k"});
    let allowed = invoke(&event);
    assert_eq!(allowed.status_code, 204);
    assert_eq!(allowed.body, "");
}

#[test]
fn test_request_metadata() {
    let mut event = common::gateway_event("GET", "/whoami");
    event["headers"] = json!({"x-forwarded-proto": "https"});
    event["requestContext"]["http"]["protocol"] = json!("HTTP/2.0");

    let response = invoke(&event);
    assert_eq!(
        body_json(&response),
        json!({
            "ip": "198.51.100.10",
            "scheme": "https",
            "protocol": "HTTP/2.0",
            "requestId": "test-request"
        })
    );
}

#[test]
fn test_malformed_events_are_errors() {
    let handler = handler();

    assert!(matches!(handler.invoke(b"{not json"), Err(GatewayError::Decode(_))));

    let mut bad_body = common::gateway_event("POST", "/echo");
    bad_body["body"] = json!("%%%");
    bad_body["isBase64Encoded"] = json!(true);
    assert!(matches!(
        handler.invoke(&common::to_payload(&bad_body)),
        Err(GatewayError::Body(_))
    ));

    let mut bad_protocol = common::gateway_event("GET", "/");
    bad_protocol["requestContext"]["http"]["protocol"] = json!("gopher");
    assert!(matches!(
        handler.invoke(&common::to_payload(&bad_protocol)),
        Err(GatewayError::Protocol(_))
    ));
}

#[test]
fn test_panicking_handler_yields_500() {
    let mut engine = switchyard::Engine::new();
    engine
        .get("/panic", |_| panic!("handler bug"))
        .unwrap();
    let handler = GatewayHandler::new(Arc::new(engine));

    let output = handler
        .invoke(&common::to_payload(&common::gateway_event("GET", "/panic")))
        .unwrap();
    let response: GatewayResponse = serde_json::from_slice(&output).unwrap();
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, r#"{"message":"Internal Server Error"}"#);
}
