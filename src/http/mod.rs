//! HTTP request/response model and the live-socket transport.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body read)
//!     → request.rs (normalize into `Request`)
//!     → [engine routes and runs the handler]
//!     → context.rs / response.rs (handler writes status, headers, body)
//!     → streaming.rs (head on first write, body streamed to the client)
//! ```

pub mod context;
pub mod cookie;
pub mod error;
pub mod handler;
pub mod mime;
pub mod request;
pub mod response;
pub mod server;
pub mod streaming;

pub use context::Context;
pub use cookie::{Cookie, SameSite};
pub use error::{CommitError, HandlerError};
pub use handler::{ErrorHandler, Handler, HandlerResult, Middleware};
pub use request::{ProtocolVersion, RawRequest, Request, Transport, X_REQUEST_ID};
pub use response::{Response, ResponseSink};
pub use server::HttpServer;
pub use streaming::{PendingResponse, StreamingSink};
