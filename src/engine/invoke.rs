//! The invoke path shared by both transports.
//!
//! # Data Flow
//! ```text
//! Request + &mut dyn ResponseSink
//!     → find_route(path) → resolve(method)
//!         hit:  extract params, wrap handler in pre + global middleware
//!         miss: not-found handler, unwrapped
//!     → run handler
//!         Err → error handler (default: JSON message, skipped if streaming began)
//!     → commit exactly once
//! ```

use std::time::Instant;

use axum::http::StatusCode;

use super::Engine;
use crate::http::handler::{self, Handler, HandlerResult, Middleware};
use crate::http::{CommitError, Context, HandlerError, Request, Response, ResponseSink};
use crate::observability::metrics;
use crate::routing::PathParams;

const NOT_FOUND_BODY: &[u8] = br#"{"message":"Not Found"}"#;

struct Resolved {
    handler: Handler,
    params: PathParams,
    route: Option<String>,
}

impl Engine {
    /// Route and run one request, then commit the response.
    ///
    /// Returns the final status. A commit failure is logged and returned;
    /// the response itself is left as the transport has it.
    pub fn invoke(
        &self,
        request: Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<StatusCode, CommitError> {
        let start = Instant::now();
        let transport = request.transport();
        let method = request.method().clone();
        let path = request.path().to_string();

        let resolved = self.resolve(&request);
        let route = resolved.route.clone();
        let mut ctx = Context::new(request, Response::new(sink), resolved.params, resolved.route);

        if let Err(err) = (resolved.handler)(&mut ctx) {
            tracing::warn!(
                method = %method,
                path = %path,
                status = %err.status_code(),
                error = %err,
                "Handler failed"
            );
            (self.error_handler)(err, &mut ctx);
        }

        let status = ctx.response().status();
        let committed = ctx.response_mut().commit();
        if let Err(e) = &committed {
            tracing::error!(method = %method, path = %path, error = %e, "Response commit failed");
        }

        tracing::debug!(
            transport = %transport,
            method = %method,
            path = %path,
            route = route.as_deref().unwrap_or("-"),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );
        metrics::record_request(transport.as_str(), &method, status.as_u16(), start);

        committed.map(|()| status)
    }

    fn resolve(&self, request: &Request) -> Resolved {
        let hit = self
            .routes
            .find_route(request.path())
            .and_then(|route| route.entry(request.method()).map(|entry| (route, entry)));

        match hit {
            Some((route, entry)) => {
                let chain: Vec<Middleware> =
                    self.pre.iter().chain(self.middleware.iter()).cloned().collect();
                Resolved {
                    handler: handler::wrap(entry.handler.clone(), &chain),
                    params: PathParams::extract(request.path(), &entry.captures),
                    route: Some(route.path().to_string()),
                }
            }
            None => Resolved {
                handler: self.not_found.clone(),
                params: PathParams::new(),
                route: None,
            },
        }
    }
}

/// 404 with `{"message":"Not Found"}`.
pub fn default_not_found(ctx: &mut Context<'_>) -> HandlerResult {
    ctx.json_bytes(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Writes `{"message": ...}` with the error's status, unless the response
/// has already started. Server errors do not echo the error text.
pub fn default_error_handler(err: HandlerError, ctx: &mut Context<'_>) {
    if ctx.response().started() {
        tracing::debug!(error = %err, "Response already started, error body skipped");
        return;
    }

    let status = err.status_code();
    let message = if status.is_server_error() {
        status.canonical_reason().unwrap_or("Internal Server Error").to_string()
    } else {
        err.to_string()
    };

    if let Err(e) = ctx.json(status, &serde_json::json!({ "message": message })) {
        tracing::error!(error = %e, "Failed to write error response");
    }
}
