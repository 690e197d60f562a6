//! Live-socket response sink.
//!
//! # Data Flow
//! ```text
//! handler thread                        connection task
//!   write_status / first write ──head──▶ PendingResponse::into_response
//!   write(chunk) ─────────────body─────▶ Body::from_stream (sent as it arrives)
//!   commit / drop ────────────close────▶ end of body
//! ```
//!
//! # Design Decisions
//! - The head (status + headers) is sent exactly once, on the first status
//!   write, body write or commit
//! - Body chunks go through a bounded channel; a write blocks the handler
//!   thread while the client is `BODY_CHANNEL_CAPACITY` chunks behind
//! - Writes must come from a blocking thread (`spawn_blocking`), never from
//!   an async task
//! - Once the connection task is gone writes fail with `BrokenPipe`

use std::convert::Infallible;
use std::io;

use axum::body::Body;
use axum::http::{header, response::Parts, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use super::cookie::Cookie;
use super::error::CommitError;
use super::response::ResponseSink;

/// Body chunks buffered between the handler and the connection.
pub const BODY_CHANNEL_CAPACITY: usize = 16;

/// Sink half, owned by the handler thread.
pub struct StreamingSink {
    status: StatusCode,
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<Parts>>,
    body_tx: mpsc::Sender<Bytes>,
    committed: bool,
}

/// Receiver half, owned by the connection task.
pub struct PendingResponse {
    head_rx: oneshot::Receiver<Parts>,
    body_rx: mpsc::Receiver<Bytes>,
}

impl StreamingSink {
    pub fn channel() -> (Self, PendingResponse) {
        Self::with_capacity(BODY_CHANNEL_CAPACITY)
    }

    /// Like `channel`, buffering at most `capacity` body chunks.
    pub fn with_capacity(capacity: usize) -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(capacity.max(1));
        let sink = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head_tx: Some(head_tx),
            body_tx,
            committed: false,
        };
        (sink, PendingResponse { head_rx, body_rx })
    }

    /// Whether status and headers have been handed to the connection.
    pub fn head_sent(&self) -> bool {
        self.head_tx.is_none()
    }

    fn send_head(&mut self) {
        let Some(tx) = self.head_tx.take() else {
            return;
        };
        let (mut parts, ()) = axum::http::Response::new(()).into_parts();
        parts.status = self.status;
        parts.headers = std::mem::take(&mut self.headers);
        if tx.send(parts).is_err() {
            tracing::debug!("Connection closed before response head was sent");
        }
    }
}

impl ResponseSink for StreamingSink {
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send_head();
        if buf.is_empty() {
            return Ok(0);
        }
        self.body_tx
            .blocking_send(Bytes::copy_from_slice(buf))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))?;
        Ok(buf.len())
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.head_sent() {
            tracing::debug!(status = %status, "Status write after head was sent");
            return;
        }
        self.status = status;
        self.send_head();
    }

    fn set_cookie(&mut self, cookie: Cookie) {
        if self.head_sent() {
            tracing::warn!(name = %cookie.name, "Cookie set after head was sent");
            return;
        }
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                self.headers.append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!(name = %cookie.name, "Cookie is not a valid header value"),
        }
    }

    fn commit(&mut self) -> Result<(), CommitError> {
        if self.committed {
            return Err(CommitError::AlreadyCommitted);
        }
        self.committed = true;
        self.send_head();
        Ok(())
    }
}

impl PendingResponse {
    /// Wait for the head, then stream the body. `None` when the sink was
    /// dropped before anything was sent.
    pub async fn into_response(self) -> Option<axum::response::Response> {
        let parts = self.head_rx.await.ok()?;
        let chunks = futures_util::stream::unfold(self.body_rx, |mut rx| async move {
            rx.recv()
                .await
                .map(|chunk| (Ok::<Bytes, Infallible>(chunk), rx))
        });
        Some(axum::response::Response::from_parts(parts, Body::from_stream(chunks)))
    }
}
