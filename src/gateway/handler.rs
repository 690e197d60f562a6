//! One-shot gateway invocation: event bytes in, response bytes out.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::event::{GatewayRequest, GatewayResponse};
use super::sink::BufferedSink;
use super::GatewayError;
use crate::engine::Engine;

/// Runs gateway events against a shared engine.
#[derive(Clone)]
pub struct GatewayHandler {
    engine: Arc<Engine>,
}

impl GatewayHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Decode an event, dispatch it and encode the response.
    ///
    /// Malformed events are returned as errors, never answered with a
    /// fabricated response.
    pub fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let event: GatewayRequest = serde_json::from_slice(payload).map_err(GatewayError::Decode)?;
        let response = self.handle(event)?;
        serde_json::to_vec(&response).map_err(GatewayError::Encode)
    }

    /// Dispatch a decoded event.
    pub fn handle(&self, event: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let request = event.into_request()?;
        let span = tracing::info_span!(
            "invocation",
            request_id = request.request_id().unwrap_or_default(),
            method = %request.method(),
            path = %request.path(),
            gateway_route = tracing::field::Empty,
        );
        if let Some(route_key) = request.raw_gateway().and_then(GatewayRequest::matched_route_key) {
            span.record("gateway_route", route_key);
        }
        let _guard = span.enter();

        let mut sink = BufferedSink::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.engine.invoke(request, &mut sink)));
        match outcome {
            Ok(Ok(status)) => tracing::debug!(status = status.as_u16(), "Invocation complete"),
            Ok(Err(e)) => tracing::error!(error = %e, "Invocation commit failed"),
            Err(_) => tracing::error!("Handler panicked during invocation"),
        }

        Ok(sink.into_output().unwrap_or_else(|| {
            tracing::error!("No response was committed, returning 500");
            GatewayResponse::internal_error()
        }))
    }
}
