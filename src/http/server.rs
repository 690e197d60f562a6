//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all dispatch handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Read the request body with a size limit
//! - Run the engine on a blocking task and stream its response back
//! - Shut down gracefully on a shutdown broadcast
//!
//! # Design Decisions
//! - Axum only accepts connections and frames HTTP; all routing is the engine's
//! - Handlers are synchronous, so each request gets a blocking task
//! - If the handler never produces a head (panic, dropped sink) the client
//!   gets a 500

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request as HttpRequest, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::engine::Engine;
use crate::http::request::{Request, X_REQUEST_ID};
use crate::http::streaming::StreamingSink;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub max_body_bytes: usize,
}

/// Live-socket server in front of an engine.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(engine: Arc<Engine>, config: AppConfig) -> Self {
        let state = AppState {
            engine,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let request_id = header::HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Catch-all handler: normalize, dispatch, stream.
async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: HttpRequest<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > state.max_body_bytes) {
        tracing::warn!(
            path = %parts.uri.path(),
            content_length = declared.unwrap_or_default(),
            limit = state.max_body_bytes,
            "Request body too large"
        );
        return error_response(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            return error_response(StatusCode::BAD_REQUEST);
        }
    };

    let request = Request::from_parts(parts, body, remote);
    let request_id = request.request_id().unwrap_or("unknown").to_string();
    let (sink, pending) = StreamingSink::channel();

    let engine = state.engine.clone();
    let task = tokio::task::spawn_blocking(move || {
        let mut sink = sink;
        engine.invoke(request, &mut sink)
    });

    if let Some(response) = pending.into_response().await {
        return response;
    }

    match task.await {
        Err(e) => tracing::error!(request_id = %request_id, error = %e, "Handler task failed"),
        Ok(Err(e)) => tracing::error!(request_id = %request_id, error = %e, "Response never started"),
        Ok(Ok(status)) => {
            tracing::error!(request_id = %request_id, status = %status, "Response head lost")
        }
    }
    error_response(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(status: StatusCode) -> Response {
    let message = status.canonical_reason().unwrap_or("Error");
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// Wait for the shutdown broadcast.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
    tracing::info!("Shutdown signal received");
}
