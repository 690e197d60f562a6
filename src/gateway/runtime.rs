//! Runtime API client: pulls invocations and posts results.
//!
//! # Responsibilities
//! - Long-poll the next invocation event
//! - Run it through `GatewayHandler` on a blocking task
//! - Post the response, or an error document when the event was unusable
//! - Report initialization failures (the client is created before the
//!   engine, so a failed engine build can still be reported)
//!
//! # Design Decisions
//! - One invocation at a time, as the runtime API requires
//! - Failures talking to the runtime API are fatal and end the loop
//! - Shutdown is checked between invocations, never mid-invocation

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::broadcast;
use url::Url;

use super::handler::GatewayHandler;
use super::GatewayError;

/// Set by the managed runtime.
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";
const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";
/// Error type posted to `/runtime/init/error`.
pub const INIT_ERROR_TYPE: &str = "Runtime.InitError";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDocument<'a> {
    error_message: &'a str,
    error_type: &'a str,
}

/// An invocation pulled from the runtime API.
#[derive(Debug)]
pub struct Invocation {
    pub request_id: String,
    pub payload: Bytes,
}

pub struct RuntimeClient {
    base: Url,
    http: reqwest::Client,
}

impl RuntimeClient {
    /// `api` is the runtime API `host:port`.
    pub fn new(api: &str) -> Result<Self, GatewayError> {
        let base = Url::parse(&format!("http://{}/{}/", api, API_VERSION))
            .map_err(|_| GatewayError::RuntimeAddress(api.to_string()))?;
        // The next-invocation call is a long poll; only bound the connect.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { base, http })
    }

    /// Use `configured` when given, else `AWS_LAMBDA_RUNTIME_API`.
    pub fn from_env(configured: Option<&str>) -> Result<Self, GatewayError> {
        let api = match configured {
            Some(api) => api.to_string(),
            None => std::env::var(RUNTIME_API_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(GatewayError::RuntimeNotConfigured)?,
        };
        Self::new(&api)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Process invocations until shutdown or a runtime API failure.
    pub async fn run(
        &self,
        handler: &GatewayHandler,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        tracing::info!(endpoint = %self.base, "Gateway runtime loop starting");

        loop {
            let invocation = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Gateway runtime loop stopping");
                    return Ok(());
                }
                next = self.next_invocation() => next?,
            };
            self.process(handler, invocation).await?;
        }
    }

    pub async fn next_invocation(&self) -> Result<Invocation, GatewayError> {
        let url = self.endpoint("runtime/invocation/next")?;
        let response = self.http.get(url.clone()).send().await?;
        check_status(response.status(), &url)?;

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(GatewayError::MissingHeader(REQUEST_ID_HEADER))?;
        let payload = response.bytes().await?;

        Ok(Invocation { request_id, payload })
    }

    /// Handle one invocation and post its outcome.
    pub async fn process(&self, handler: &GatewayHandler, invocation: Invocation) -> Result<(), GatewayError> {
        let Invocation { request_id, payload } = invocation;
        let handler = handler.clone();
        let outcome = tokio::task::spawn_blocking(move || handler.invoke(&payload)).await;

        match outcome {
            Ok(Ok(body)) => {
                let url = self.endpoint(&format!("runtime/invocation/{}/response", request_id))?;
                let response = self.http.post(url.clone()).body(body).send().await?;
                check_status(response.status(), &url)
            }
            Ok(Err(err)) => {
                tracing::warn!(request_id = %request_id, error = %err, "Invocation rejected");
                let path = format!("runtime/invocation/{}/error", request_id);
                self.post_error(&path, "InvalidEvent", &err.to_string()).await
            }
            Err(join) => {
                tracing::error!(request_id = %request_id, error = %join, "Invocation task failed");
                let path = format!("runtime/invocation/{}/error", request_id);
                self.post_error(&path, "Runtime.Panic", "invocation task failed").await
            }
        }
    }

    /// Report a failure that happened before the first invocation.
    pub async fn report_init_error(&self, error_type: &str, message: &str) -> Result<(), GatewayError> {
        self.post_error("runtime/init/error", error_type, message).await
    }

    async fn post_error(&self, path: &str, error_type: &str, message: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(path)?;
        let document = ErrorDocument {
            error_message: message,
            error_type,
        };
        let response = self
            .http
            .post(url.clone())
            .header(ERROR_TYPE_HEADER, error_type)
            .json(&document)
            .send()
            .await?;
        check_status(response.status(), &url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path)
            .map_err(|_| GatewayError::RuntimeAddress(format!("{}{}", self.base, path)))
    }
}

fn check_status(status: StatusCode, url: &Url) -> Result<(), GatewayError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(GatewayError::RuntimeStatus {
            status: status.as_u16(),
            endpoint: url.path().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let client = RuntimeClient::new("127.0.0.1:9001").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9001/2018-06-01/");
        assert_eq!(
            client.endpoint("runtime/invocation/abc/response").unwrap().as_str(),
            "http://127.0.0.1:9001/2018-06-01/runtime/invocation/abc/response"
        );
    }

    #[test]
    fn test_configured_address_wins() {
        let client = RuntimeClient::from_env(Some("localhost:9009")).unwrap();
        assert_eq!(client.base_url().port(), Some(9009));
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            RuntimeClient::new("bad host:x"),
            Err(GatewayError::RuntimeAddress(_))
        ));
    }
}
