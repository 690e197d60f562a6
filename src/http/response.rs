//! Response side of a request: the sink contract and the handler-facing
//! writer on top of it.
//!
//! # Responsibilities
//! - Define `ResponseSink`, implemented once per transport
//! - Track what the handler has done so far (status, bytes, committed)
//! - Expose `std::io::Write` so serializers can stream straight into it
//!
//! # Design Decisions
//! - Status is fixed by the first `write_status` or first body write
//! - `commit` is the single finalization point; calling it twice is an error
//!   and never changes the first outcome

use std::io;

use axum::http::{HeaderMap, StatusCode};

use super::cookie::Cookie;
use super::error::CommitError;

/// Transport-specific response writer.
///
/// Live socket: status and headers go out on the first body write or status
/// write, body bytes stream as they are written. Gateway: everything is
/// buffered and emitted on `commit`.
pub trait ResponseSink: Send {
    /// Mutable response headers. Changes after the head has been sent are
    /// not transmitted.
    fn headers(&mut self) -> &mut HeaderMap;

    /// Append body bytes. Fails when the peer is gone.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn write_status(&mut self, status: StatusCode);

    /// Queue a `Set-Cookie`. Cookies with invalid names are dropped.
    fn set_cookie(&mut self, cookie: Cookie);

    /// Finalize the response.
    fn commit(&mut self) -> Result<(), CommitError>;
}

/// Handler-facing response. Wraps the transport sink for one request.
pub struct Response<'a> {
    sink: &'a mut dyn ResponseSink,
    status: Option<StatusCode>,
    size: usize,
    committed: bool,
}

impl<'a> Response<'a> {
    pub fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self {
            sink,
            status: None,
            size: 0,
            committed: false,
        }
    }

    pub fn headers(&mut self) -> &mut HeaderMap {
        self.sink.headers()
    }

    /// Set the status. Only the first call has an effect.
    pub fn write_status(&mut self, status: StatusCode) {
        if self.status.is_some() {
            tracing::debug!(
                current = %self.status(),
                ignored = %status,
                "Superfluous status write"
            );
            return;
        }
        self.status = Some(status);
        self.sink.write_status(status);
    }

    pub fn set_cookie(&mut self, cookie: Cookie) {
        if !cookie.is_valid() {
            tracing::warn!(name = %cookie.name, "Dropping cookie with invalid name or value");
            return;
        }
        self.sink.set_cookie(cookie);
    }

    pub fn commit(&mut self) -> Result<(), CommitError> {
        if self.committed {
            return Err(CommitError::AlreadyCommitted);
        }
        self.committed = true;
        self.status.get_or_insert(StatusCode::OK);
        self.sink.commit()
    }

    /// Status sent or to be sent. 200 until something else was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Body bytes written so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the status or any body byte has been written.
    pub fn started(&self) -> bool {
        self.status.is_some() || self.size > 0
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

impl io::Write for Response<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        let written = self.sink.write(buf)?;
        self.size += written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
