//! Startup orchestration.
//!
//! # Responsibilities
//! - Decide once which transport serves the engine
//! - Bind the listener or connect to the runtime API
//! - Run until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - In gateway mode the runtime client exists before the engine is built,
//!   so a route configuration error is posted to the runtime API's init
//!   error endpoint before the process exits
//! - Environment detection only applies in `auto` mode; an explicit mode in
//!   config or on the command line wins
//! - The listener is bound last, after the engine is fully built

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use super::shutdown::Shutdown;
use crate::config::{AppConfig, RuntimeMode};
use crate::engine::Engine;
use crate::gateway::runtime::{INIT_ERROR_TYPE, RUNTIME_API_ENV};
use crate::gateway::{GatewayError, GatewayHandler, RuntimeClient};
use crate::http::HttpServer;
use crate::routing::RouteError;

/// Set by the gateway's local server emulation.
pub const LAMBDA_SERVER_PORT_ENV: &str = "_LAMBDA_SERVER_PORT";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("route configuration error: {0}")]
    Route(#[from] RouteError),
}

/// The transport chosen for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    Server,
    Gateway,
}

impl Launcher {
    /// Select from the configured mode and the process environment.
    pub fn select(mode: RuntimeMode) -> Self {
        Self::select_with(mode, |key| std::env::var(key).ok())
    }

    /// Select with an explicit environment lookup.
    pub fn select_with<F>(mode: RuntimeMode, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match mode {
            RuntimeMode::Server => Launcher::Server,
            RuntimeMode::Gateway => Launcher::Gateway,
            RuntimeMode::Auto => {
                let present = |key: &str| env(key).is_some_and(|v| !v.is_empty());
                if present(LAMBDA_SERVER_PORT_ENV) || present(RUNTIME_API_ENV) {
                    Launcher::Gateway
                } else {
                    Launcher::Server
                }
            }
        }
    }

    /// Build the engine with `build`, then serve it until `shutdown` fires
    /// or the transport fails.
    pub async fn launch<B>(
        self,
        build: B,
        config: AppConfig,
        shutdown: &Shutdown,
    ) -> Result<(), StartupError>
    where
        B: FnOnce() -> Result<Engine, RouteError>,
    {
        match self {
            Launcher::Server => {
                let engine = Arc::new(build()?);
                log_routes(&engine);

                let address = config.listener.bind_address.clone();
                let listener = TcpListener::bind(&address)
                    .await
                    .map_err(|source| StartupError::Bind { address, source })?;
                tracing::info!(
                    address = %listener.local_addr()?,
                    request_timeout_secs = config.timeouts.request_secs,
                    max_body_bytes = config.listener.max_body_bytes,
                    "Listening for connections"
                );
                HttpServer::new(engine, config)
                    .run(listener, shutdown.subscribe())
                    .await?;
            }
            Launcher::Gateway => {
                let client = RuntimeClient::from_env(config.gateway.runtime_api.as_deref())?;
                let engine = match build() {
                    Ok(engine) => Arc::new(engine),
                    Err(err) => {
                        tracing::error!(error = %err, "Engine build failed");
                        let reported = client
                            .report_init_error(INIT_ERROR_TYPE, &err.to_string())
                            .await;
                        if let Err(report) = reported {
                            tracing::error!(error = %report, "Failed to report init error to runtime API");
                        }
                        return Err(err.into());
                    }
                };
                log_routes(&engine);

                let handler = GatewayHandler::new(engine);
                client.run(&handler, shutdown.subscribe()).await?;
            }
        }
        Ok(())
    }
}

fn log_routes(engine: &Engine) {
    for (method, path) in engine.routes() {
        tracing::info!(method = %method, path = %path, "Route");
    }
}
