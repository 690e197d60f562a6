//! Live-socket round trips over TCP.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use switchyard::http::handler::HandlerResult;
use switchyard::{app, Context, Engine};

mod common;

#[tokio::test]
async fn test_demo_routes() {
    let addr = "127.0.0.1:38181";
    let shutdown = common::start_server(app::build_engine().unwrap(), addr, |_| {}).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["server"], "switchyard");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"hello": "world"}));

    let res = client.patch(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"hello": "world any"}));

    let res = client.get(format!("http://{addr}/docs/guide/intro")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"hello": "docs/guide/intro"}));

    let res = client
        .get(format!("http://{addr}/users/7"))
        .header("cookie", "visits=4")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["set-cookie"], "visits=5; Path=/; HttpOnly; SameSite=Lax");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "7", "visits": 5}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_not_found_and_errors() {
    let addr = "127.0.0.1:38182";
    let shutdown = common::start_server(app::build_engine().unwrap(), addr, |_| {}).await;
    let client = reqwest::Client::new();

    let res = client.post(format!("http://{addr}/tt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["content-type"], "application/json; charset=UTF-8");
    assert_eq!(res.text().await.unwrap(), r#"{"message":"Not Found"}"#);

    let res = client.delete(format!("http://{addr}/users/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"message": "missing api key"}));

    let res = client
        .delete(format!("http://{addr}/users/1"))
        .header("x-api-key", "k")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    shutdown.trigger();
}

#[tokio::test]
async fn test_echo_and_body_limit() {
    let addr = "127.0.0.1:38183";
    let shutdown = common::start_server(app::build_engine().unwrap(), addr, |config| {
        config.listener.max_body_bytes = 16;
    })
    .await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/echo"))
        .header("content-type", "text/plain")
        .body("short body")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await.unwrap(), "short body");

    let res = client
        .post(format!("http://{addr}/echo"))
        .body("this body is longer than sixteen bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

fn chunked(ctx: &mut Context<'_>) -> HandlerResult {
    ctx.response_mut()
        .headers()
        .insert("content-type", "text/plain".parse().unwrap());
    for i in 0..3 {
        ctx.write(format!("chunk-{i};").as_bytes())?;
        std::thread::sleep(Duration::from_millis(5));
    }
    Ok(())
}

#[tokio::test]
async fn test_streaming_and_failures() {
    let mut engine = Engine::new();
    engine
        .get("/stream", chunked)
        .unwrap()
        .get("/panic", |_| panic!("handler bug"))
        .unwrap()
        .get("/late-header", |ctx| {
            ctx.text(StatusCode::ACCEPTED, "body")?;
            ctx.response_mut()
                .headers()
                .insert("x-too-late", "1".parse().unwrap());
            Ok(())
        })
        .unwrap();

    let addr = "127.0.0.1:38184";
    let shutdown = common::start_server(engine, addr, |_| {}).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{addr}/stream")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "chunk-0;chunk-1;chunk-2;");

    let res = client.get(format!("http://{addr}/panic")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = client.get(format!("http://{addr}/late-header")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert!(res.headers().get("x-too-late").is_none());
    assert_eq!(res.text().await.unwrap(), "body");

    shutdown.trigger();
}
