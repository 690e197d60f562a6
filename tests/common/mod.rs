//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use switchyard::config::AppConfig;
use switchyard::{Engine, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Start a live server for `engine` on `addr` and wait until it accepts.
pub async fn start_server(engine: Engine, addr: &str, configure: impl FnOnce(&mut AppConfig)) -> Shutdown {
    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();
    configure(&mut config);

    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server = HttpServer::new(Arc::new(engine), config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    wait_for_port(addr).await;
    shutdown
}

async fn wait_for_port(addr: &str) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server on {addr} did not start");
}

/// Minimal API Gateway v2 event.
pub fn gateway_event(method: &str, raw_path: &str) -> Value {
    json!({
        "version": "2.0",
        "routeKey": "$default",
        "rawPath": raw_path,
        "rawQueryString": "",
        "headers": {},
        "requestContext": {
            "requestId": "test-request",
            "http": {
                "method": method,
                "path": raw_path,
                "protocol": "HTTP/1.1",
                "sourceIp": "198.51.100.10",
                "userAgent": "switchyard-tests"
            }
        },
        "isBase64Encoded": false
    })
}

pub fn to_payload(event: &Value) -> Vec<u8> {
    serde_json::to_vec(event).unwrap()
}
