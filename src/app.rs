//! Demo application served by the binary.
//!
//! Shows the registration surface: per-method routes on the same pattern,
//! an "any" fallback, named and greedy wildcards, cookies, global
//! middleware and route-scoped middleware.

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::json;

use crate::engine::Engine;
use crate::http::handler::{handler, middleware, Middleware};
use crate::http::{mime, Cookie, HandlerError, SameSite};
use crate::routing::RouteError;

/// 1x1 transparent PNG.
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// Adds `server: switchyard` to every routed response.
fn server_header() -> Middleware {
    middleware(|next| {
        handler(move |ctx| {
            ctx.response_mut()
                .headers()
                .insert(header::SERVER, HeaderValue::from_static("switchyard"));
            next(ctx)
        })
    })
}

/// Rejects requests without an `x-api-key` header.
fn require_api_key() -> Middleware {
    middleware(|next| {
        handler(move |ctx| {
            if ctx.request().header("x-api-key").is_none() {
                return Err(HandlerError::new(StatusCode::UNAUTHORIZED, "missing api key"));
            }
            next(ctx)
        })
    })
}

pub fn build_engine() -> Result<Engine, RouteError> {
    let mut engine = Engine::new();
    engine.use_middleware(server_header());

    engine
        .get("/", |ctx| ctx.json(StatusCode::OK, &json!({ "hello": "world" })))?
        .any("/", |ctx| ctx.json(StatusCode::OK, &json!({ "hello": "world any" })))?
        .post("/", |ctx| ctx.json(StatusCode::OK, &json!({ "hello": "world post" })))?
        .get("/tt", |ctx| ctx.json(StatusCode::OK, &json!({ "hello tt": "world get" })))?
        .get("/{param+}", |ctx| {
            let param = ctx.param("param").unwrap_or_default().to_string();
            ctx.json(StatusCode::OK, &json!({ "hello": param }))
        })?
        .get("/users/{id}", |ctx| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            let visits = ctx
                .cookie("visits")
                .and_then(|c| c.value.parse::<u32>().ok())
                .unwrap_or(0)
                + 1;
            ctx.set_cookie(
                Cookie::new("visits", visits.to_string())
                    .with_path("/")
                    .http_only()
                    .with_same_site(SameSite::Lax),
            );
            ctx.json(StatusCode::OK, &json!({ "id": id, "visits": visits }))
        })?
        .post("/echo", |ctx| {
            let content_type = ctx
                .request()
                .header("content-type")
                .unwrap_or(mime::TEXT_PLAIN_UTF8)
                .to_string();
            let body = ctx.request().body().clone();
            ctx.result(StatusCode::OK, &content_type, &body)
        })?
        .get("/pixel.png", |ctx| ctx.result(StatusCode::OK, "image/png", PIXEL_PNG))?
        .get("/whoami", |ctx| {
            let body = json!({
                "ip": ctx.real_ip(),
                "scheme": ctx.scheme(),
                "protocol": ctx.request().version().to_string(),
                "requestId": ctx.request().request_id(),
            });
            ctx.json(StatusCode::OK, &body)
        })?
        .delete_with(
            "/users/{id}",
            |ctx| ctx.no_content(StatusCode::NO_CONTENT),
            &[require_api_key()],
        )?;

    Ok(engine)
}
