//! switchyard: one set of HTTP handlers, two transports.
//!
//! # Architecture Overview
//!
//! ```text
//!   live socket                                   gateway event
//!   ───────────▶ http::server ──┐          ┌── gateway::runtime ◀───────────
//!                (axum, tower)  │          │   (runtime API, reqwest)
//!                               ▼          ▼
//!                         http::request (Request)
//!                                   │
//!                                   ▼
//!                    engine ── routing (trie + dispatch)
//!                      │        middleware → handler(Context)
//!                      ▼
//!                  ResponseSink
//!          ┌────────────┴────────────┐
//!   http::streaming            gateway::sink
//!   (head on first write,      (buffer, commit once,
//!    body streamed)             base64/folding → JSON)
//! ```

pub mod app;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use engine::Engine;
pub use gateway::GatewayHandler;
pub use http::{Context, Cookie, HandlerError, HttpServer, Request};
pub use lifecycle::{Launcher, Shutdown};
pub use routing::{MethodSpec, RouteError};
