//! Serverless gateway transport.
//!
//! # Data Flow
//! ```text
//! Runtime API (runtime.rs)
//!     → GET next invocation (event JSON)
//!     → handler.rs: event.rs decode → engine.invoke(request, BufferedSink)
//!     → sink.rs commit → GatewayResponse JSON
//!     → POST response (or error) back to the runtime API
//! ```
//!
//! # Design Decisions
//! - Decoding failures are errors for the caller, not synthesized responses
//! - The handler is synchronous; the runtime loop runs it on a blocking task
//! - A handler panic still yields a generic 500 response

pub mod event;
pub mod handler;
pub mod runtime;
pub mod sink;

use thiserror::Error;

use crate::http::request::InvalidProtocol;

pub use event::{GatewayRequest, GatewayResponse};
pub use handler::GatewayHandler;
pub use runtime::RuntimeClient;
pub use sink::BufferedSink;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("malformed event: {0}")]
    Decode(serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(serde_json::Error),

    #[error("invalid base64 body: {0}")]
    Body(#[from] base64::DecodeError),

    #[error("invalid method: {0:?}")]
    Method(String),

    #[error("invalid header: {name:?}")]
    Header { name: String },

    #[error(transparent)]
    Protocol(#[from] InvalidProtocol),

    #[error("runtime API not configured: set AWS_LAMBDA_RUNTIME_API or gateway.runtime_api")]
    RuntimeNotConfigured,

    #[error("invalid runtime API address {0:?}")]
    RuntimeAddress(String),

    #[error("runtime API request failed: {0}")]
    Runtime(#[from] reqwest::Error),

    #[error("runtime API returned {status} for {endpoint}")]
    RuntimeStatus { status: u16, endpoint: String },

    #[error("runtime API response missing {0} header")]
    MissingHeader(&'static str),
}
