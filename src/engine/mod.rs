//! Routing engine: the registration surface and the shared invoke path.
//!
//! # Responsibilities
//! - Register routes per method with optional route-scoped middleware
//! - Hold pre-middleware, global middleware, the not-found and error handlers
//! - Run one request against a `ResponseSink` (see `invoke.rs`)
//!
//! # Design Decisions
//! - Built mutably during setup, then shared as `Arc<Engine>`; request
//!   handling only takes `&self`
//! - Route-scoped middleware is composed at registration, pre and global
//!   middleware at dispatch, so global middleware added after a route still
//!   applies to it
//! - Order, outermost first: pre, global, route, handler

mod invoke;

use axum::http::Method;

use crate::http::handler::{self, ErrorHandler, Handler, HandlerResult, Middleware};
use crate::http::{Context, HandlerError};
use crate::routing::{MethodSpec, RouteError, RouteTable};

pub use invoke::{default_error_handler, default_not_found};

pub struct Engine {
    routes: RouteTable<Handler>,
    pre: Vec<Middleware>,
    middleware: Vec<Middleware>,
    not_found: Handler,
    error_handler: ErrorHandler,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_routes {
    ($($name:ident, $name_with:ident => $method:expr;)*) => {
        $(
            pub fn $name<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
            where
                F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
            {
                self.add_route($method.into(), path, handler::handler(f), &[])
            }

            pub fn $name_with<F>(
                &mut self,
                path: &str,
                f: F,
                middleware: &[Middleware],
            ) -> Result<&mut Self, RouteError>
            where
                F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
            {
                self.add_route($method.into(), path, handler::handler(f), middleware)
            }
        )*
    };
}

impl Engine {
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            pre: Vec::new(),
            middleware: Vec::new(),
            not_found: handler::handler(default_not_found),
            error_handler: handler::error_handler(default_error_handler),
        }
    }

    /// Register `handler` for `spec` at `path`, wrapped in `middleware`.
    /// Registering the same method and path again replaces the handler.
    pub fn add_route(
        &mut self,
        spec: MethodSpec,
        path: &str,
        handler: Handler,
        middleware: &[Middleware],
    ) -> Result<&mut Self, RouteError> {
        let method = spec.to_string();
        let handler = handler::wrap(handler, middleware);
        self.routes.add_route(spec, path, handler)?;
        tracing::debug!(method = %method, path = %path, "Route registered");
        Ok(self)
    }

    method_routes! {
        get, get_with => Method::GET;
        head, head_with => Method::HEAD;
        post, post_with => Method::POST;
        put, put_with => Method::PUT;
        patch, patch_with => Method::PATCH;
        delete, delete_with => Method::DELETE;
        connect, connect_with => Method::CONNECT;
        options, options_with => Method::OPTIONS;
        trace, trace_with => Method::TRACE;
        any, any_with => MethodSpec::Any;
    }

    /// Middleware that runs before the global chain.
    pub fn pre(&mut self, middleware: Middleware) -> &mut Self {
        self.pre.push(middleware);
        self
    }

    /// Global middleware, applied to every matched route.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Replace the handler used when no route or method matches. It runs
    /// without pre or global middleware.
    pub fn set_not_found<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.not_found = handler::handler(f);
        self
    }

    pub fn set_error_handler<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(HandlerError, &mut Context<'_>) + Send + Sync + 'static,
    {
        self.error_handler = handler::error_handler(f);
        self
    }

    /// Remove one method registration. Returns whether it existed.
    pub fn del_route(&mut self, spec: &MethodSpec, path: &str) -> bool {
        self.routes.del_route(spec, path)
    }

    /// Registered (method, pattern) pairs sorted by pattern.
    pub fn routes(&self) -> Vec<(MethodSpec, String)> {
        self.routes.routes()
    }
}
