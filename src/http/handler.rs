//! Handler, middleware and error-handler types.

use std::sync::Arc;

use super::context::Context;
use super::error::HandlerError;

pub type HandlerResult = Result<(), HandlerError>;

/// A request handler. Runs synchronously on a blocking-capable thread.
pub type Handler = Arc<dyn Fn(&mut Context<'_>) -> HandlerResult + Send + Sync>;

/// Wraps a handler into another handler.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Receives handler failures and writes the error response.
pub type ErrorHandler = Arc<dyn Fn(HandlerError, &mut Context<'_>) + Send + Sync>;

pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn error_handler<F>(f: F) -> ErrorHandler
where
    F: Fn(HandlerError, &mut Context<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compose a chain around a handler. The first middleware in `chain` runs
/// outermost.
pub fn wrap(handler: Handler, chain: &[Middleware]) -> Handler {
    chain.iter().rev().fold(handler, |next, mw| mw(next))
}
