//! API Gateway HTTP API (payload v2) event and response shapes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use super::GatewayError;
use crate::http::request::RawRequest;
use crate::http::{ProtocolVersion, Request, Transport};

/// Route key of a gateway catch-all integration.
pub const DEFAULT_ROUTE_KEY: &str = "$default";

/// Treat an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Incoming invocation event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayRequest {
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub route_key: String,
    #[serde(deserialize_with = "nullable")]
    pub raw_path: String,
    #[serde(deserialize_with = "nullable")]
    pub raw_query_string: String,
    #[serde(deserialize_with = "nullable")]
    pub cookies: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,
    /// Filled by the gateway from its own route template. Routing here uses
    /// `raw_path`; handlers can read these through `Request::raw_gateway`.
    #[serde(deserialize_with = "nullable")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub stage_variables: HashMap<String, String>,
    pub request_context: RequestContext,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestContext {
    #[serde(deserialize_with = "nullable")]
    pub account_id: String,
    #[serde(deserialize_with = "nullable")]
    pub api_id: String,
    #[serde(deserialize_with = "nullable")]
    pub domain_name: String,
    #[serde(deserialize_with = "nullable")]
    pub request_id: String,
    #[serde(deserialize_with = "nullable")]
    pub route_key: String,
    #[serde(deserialize_with = "nullable")]
    pub stage: String,
    pub time_epoch: i64,
    pub http: HttpDescription,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpDescription {
    #[serde(deserialize_with = "nullable")]
    pub method: String,
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    #[serde(deserialize_with = "nullable")]
    pub protocol: String,
    #[serde(deserialize_with = "nullable")]
    pub source_ip: String,
    #[serde(deserialize_with = "nullable")]
    pub user_agent: String,
}

/// Structured response returned to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// Generic failure used when no response could be produced.
    pub fn internal_error() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            header::CONTENT_TYPE.as_str().to_string(),
            crate::http::mime::APPLICATION_JSON_UTF8.to_string(),
        );
        Self {
            status_code: 500,
            headers,
            body: r#"{"message":"Internal Server Error"}"#.to_string(),
            ..Self::default()
        }
    }
}

impl GatewayRequest {
    /// Normalize the event into a `Request`.
    ///
    /// Routing uses `rawPath` (falling back to `requestContext.http.path`).
    /// Cookies, which the gateway strips out of the headers, are rejoined into
    /// a single `Cookie` header. An empty protocol means HTTP/1.1.
    pub fn into_request(self) -> Result<Request, GatewayError> {
        let http = &self.request_context.http;

        let method = Method::from_bytes(http.method.as_bytes())
            .map_err(|_| GatewayError::Method(http.method.clone()))?;

        let version = if http.protocol.is_empty() {
            ProtocolVersion::default()
        } else {
            http.protocol.parse()?
        };

        let body = match self.body.as_deref() {
            Some(body) if self.is_base64_encoded => Bytes::from(STANDARD.decode(body)?),
            Some(body) => Bytes::copy_from_slice(body.as_bytes()),
            None => Bytes::new(),
        };

        let mut headers = HeaderMap::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| GatewayError::Header { name: name.clone() })?;
            let header_value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|_| GatewayError::Header { name: name.clone() })?;
            headers.append(header_name, header_value);
        }
        if !self.cookies.is_empty() {
            let joined = HeaderValue::from_str(&self.cookies.join("; ")).map_err(|_| {
                GatewayError::Header {
                    name: header::COOKIE.as_str().to_string(),
                }
            })?;
            headers.insert(header::COOKIE, joined);
        }

        let path = if self.raw_path.is_empty() {
            http.path.clone()
        } else {
            self.raw_path.clone()
        };

        let request_id = if self.request_context.request_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.request_context.request_id.clone()
        };

        let request = Request::new(method, path, Transport::Gateway)
            .with_query(self.raw_query_string.clone())
            .with_headers(headers)
            .with_body(body)
            .with_remote_addr(http.source_ip.clone())
            .with_version(version)
            .with_request_id(request_id);
        Ok(request.with_raw(RawRequest::Gateway(Arc::new(self))))
    }

    /// The gateway's own route key, when it matched something more specific
    /// than the catch-all `$default`.
    pub fn matched_route_key(&self) -> Option<&str> {
        Some(self.route_key.as_str()).filter(|key| !key.is_empty() && *key != DEFAULT_ROUTE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> GatewayRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_full_event() {
        let request = event(
            r#"{
                "version": "2.0",
                "routeKey": "$default",
                "rawPath": "/users/42",
                "rawQueryString": "verbose=1&tag=a%20b",
                "cookies": ["session=abc", "theme=dark"],
                "headers": {"content-type": "application/json", "x-forwarded-for": "203.0.113.9"},
                "pathParameters": {"ignored": "yes"},
                "requestContext": {
                    "requestId": "req-1",
                    "http": {
                        "method": "POST",
                        "path": "/stage/users/42",
                        "protocol": "HTTP/1.1",
                        "sourceIp": "203.0.113.9",
                        "userAgent": "curl/8"
                    }
                },
                "body": "{\"name\":\"x\"}",
                "isBase64Encoded": false
            }"#,
        )
        .into_request()
        .unwrap();

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.path(), "/users/42");
        assert_eq!(request.query("tag"), Some("a b"));
        assert_eq!(request.cookie("theme").map(|c| c.value.as_str()), Some("dark"));
        assert_eq!(request.header("cookie"), Some("session=abc; theme=dark"));
        assert_eq!(request.body().as_ref(), br#"{"name":"x"}"#);
        assert_eq!(request.remote_addr(), "203.0.113.9");
        assert_eq!(request.version(), ProtocolVersion::HTTP_11);
        assert_eq!(request.request_id(), Some("req-1"));
        assert_eq!(request.transport(), Transport::Gateway);

        let raw = request.raw_gateway().unwrap();
        assert_eq!(raw.path_parameters["ignored"], "yes");
        assert_eq!(raw.body.as_deref(), Some(r#"{"name":"x"}"#));
        assert_eq!(raw.matched_route_key(), None);
        assert!(request.raw_http().is_none());
    }

    #[test]
    fn test_matched_route_key() {
        let scoped = event(r#"{"routeKey": "GET /users/{id}", "requestContext": {"http": {"method": "GET"}}}"#);
        assert_eq!(scoped.matched_route_key(), Some("GET /users/{id}"));
        assert_eq!(event(r#"{"routeKey": "$default"}"#).matched_route_key(), None);
        assert_eq!(event("{}").matched_route_key(), None);
    }

    #[test]
    fn test_base64_body_and_nulls() {
        let request = event(
            r#"{
                "rawPath": "/upload",
                "cookies": null,
                "headers": null,
                "requestContext": {"http": {"method": "PUT", "protocol": ""}},
                "body": "AAEC/w==",
                "isBase64Encoded": true
            }"#,
        )
        .into_request()
        .unwrap();

        assert_eq!(request.body().as_ref(), &[0x00, 0x01, 0x02, 0xff]);
        assert!(request.cookies().is_empty());
        assert_eq!(request.version(), ProtocolVersion::HTTP_11);
        assert!(request.request_id().is_some());
    }

    #[test]
    fn test_decoding_errors() {
        let bad_base64 = event(
            r#"{"rawPath": "/", "requestContext": {"http": {"method": "GET"}},
                "body": "***", "isBase64Encoded": true}"#,
        );
        assert!(matches!(bad_base64.into_request(), Err(GatewayError::Body(_))));

        let bad_protocol =
            event(r#"{"rawPath": "/", "requestContext": {"http": {"method": "GET", "protocol": "HTTP/one"}}}"#);
        assert!(matches!(bad_protocol.into_request(), Err(GatewayError::Protocol(_))));

        let bad_header = event(
            r#"{"rawPath": "/", "headers": {"bad header": "x"},
                "requestContext": {"http": {"method": "GET"}}}"#,
        );
        assert!(matches!(bad_header.into_request(), Err(GatewayError::Header { .. })));

        let bad_method =
            event(r#"{"rawPath": "/", "requestContext": {"http": {"method": "GE T"}}}"#);
        assert!(matches!(bad_method.into_request(), Err(GatewayError::Method(_))));
    }

    #[test]
    fn test_path_falls_back_to_context() {
        let request = event(r#"{"requestContext": {"http": {"method": "GET", "path": "/ctx"}}}"#)
            .into_request()
            .unwrap();
        assert_eq!(request.path(), "/ctx");
    }

    #[test]
    fn test_response_omits_empty_collections() {
        let response = GatewayResponse {
            status_code: 204,
            ..GatewayResponse::default()
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"statusCode": 204, "body": "", "isBase64Encoded": false})
        );
    }
}
