//! Transport-neutral request.
//!
//! # Responsibilities
//! - Hold everything a handler may read: method, path, query, headers,
//!   cookies, body, remote address, protocol version, request ID
//! - Normalize both entry points (live socket, gateway event) into one shape
//! - Derive scheme and client IP from forwarding headers
//!
//! # Design Decisions
//! - The body is fully buffered before dispatch (`Bytes`, cheap to clone)
//! - Query and cookies are parsed once at construction
//! - Request ID taken from `x-request-id` when the transport set one

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::{header, request::Parts, HeaderMap, Method, Version};
use bytes::Bytes;
use thiserror::Error;

use super::cookie::Cookie;
use crate::gateway::GatewayRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Which entry point produced the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Socket,
    Gateway,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Socket => "socket",
            Transport::Gateway => "gateway",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP protocol version as (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const HTTP_10: Self = Self { major: 1, minor: 0 };
    pub const HTTP_11: Self = Self { major: 1, minor: 1 };
    pub const HTTP_2: Self = Self { major: 2, minor: 0 };
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl From<Version> for ProtocolVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::HTTP_09 => Self { major: 0, minor: 9 },
            Version::HTTP_10 => Self::HTTP_10,
            Version::HTTP_2 => Self::HTTP_2,
            Version::HTTP_3 => Self { major: 3, minor: 0 },
            _ => Self::HTTP_11,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Returned when a protocol string is not `HTTP/<major>[.<minor>]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid protocol version: {0:?}")]
pub struct InvalidProtocol(pub String);

impl FromStr for ProtocolVersion {
    type Err = InvalidProtocol;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidProtocol(raw.to_string());
        let version = raw.strip_prefix("HTTP/").ok_or_else(invalid)?;
        let (major, minor) = version.split_once('.').unwrap_or((version, "0"));
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

/// The request exactly as the transport delivered it.
#[derive(Debug, Clone)]
pub enum RawRequest {
    /// Head of the live-socket request. The body lives in `Request::body`.
    Http(Arc<Parts>),
    /// The decoded gateway event, body included.
    Gateway(Arc<GatewayRequest>),
}

/// A request as handlers see it.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    raw_query: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Bytes,
    remote_addr: String,
    version: ProtocolVersion,
    request_id: Option<String>,
    transport: Transport,
    raw: Option<RawRequest>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, transport: Transport) -> Self {
        Self {
            method,
            path: path.into(),
            raw_query: String::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            remote_addr: String::new(),
            version: ProtocolVersion::default(),
            request_id: None,
            transport,
            raw: None,
        }
    }

    /// Build from a request head received on the live socket.
    pub fn from_parts(parts: Parts, body: Bytes, remote: SocketAddr) -> Self {
        let query = parts.uri.query().unwrap_or_default().to_string();
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut request = Self::new(parts.method.clone(), parts.uri.path(), Transport::Socket)
            .with_query(query)
            .with_headers(parts.headers.clone())
            .with_body(body)
            .with_remote_addr(remote.to_string())
            .with_version(parts.version.into());
        request.request_id = request_id;
        request.with_raw(RawRequest::Http(Arc::new(parts)))
    }

    pub fn with_query(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = raw_query.into();
        self.query = url::form_urlencoded::parse(self.raw_query.as_bytes())
            .into_owned()
            .collect();
        self
    }

    /// Replace the headers. Cookies are re-parsed from every `Cookie` header.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.cookies = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::parse_header)
            .collect();
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_raw(mut self, raw: RawRequest) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The routing key: path only, no query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Decoded query pairs in arrival order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value for a query key.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, when it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// First cookie with the given name.
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn raw(&self) -> Option<&RawRequest> {
        self.raw.as_ref()
    }

    /// Original request head, when the request came in on the live socket.
    pub fn raw_http(&self) -> Option<&Parts> {
        match &self.raw {
            Some(RawRequest::Http(parts)) => Some(parts),
            _ => None,
        }
    }

    /// Original event, when the request came in through the gateway.
    pub fn raw_gateway(&self) -> Option<&GatewayRequest> {
        match &self.raw {
            Some(RawRequest::Gateway(event)) => Some(event),
            _ => None,
        }
    }

    /// Scheme as seen by the client, from proxy headers. Defaults to `http`.
    pub fn scheme(&self) -> &str {
        if let Some(proto) = self.header("x-forwarded-proto") {
            return proto;
        }
        if let Some(proto) = self.header("x-forwarded-protocol") {
            return proto;
        }
        if self.header("x-forwarded-ssl") == Some("on") {
            return "https";
        }
        if let Some(scheme) = self.header("x-url-scheme") {
            return scheme;
        }
        "http"
    }

    /// Client IP: first `X-Forwarded-For` entry, then `X-Real-Ip`, then the
    /// host part of the remote address.
    pub fn real_ip(&self) -> &str {
        if let Some(forwarded) = self.header("x-forwarded-for") {
            let first = forwarded.split(',').next().unwrap_or_default().trim();
            if !first.is_empty() {
                return first;
            }
        }
        if let Some(real_ip) = self.header("x-real-ip") {
            return real_ip;
        }
        match self.remote_addr.parse::<SocketAddr>() {
            Ok(_) => self
                .remote_addr
                .rsplit_once(':')
                .map(|(host, _)| host.trim_start_matches('[').trim_end_matches(']'))
                .unwrap_or(&self.remote_addr),
            Err(_) => &self.remote_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request_with(headers: &[(&'static str, &'static str)]) -> Request {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, HeaderValue::from_static(v));
        }
        Request::new(Method::GET, "/", Transport::Socket)
            .with_headers(map)
            .with_remote_addr("10.0.0.9:5123")
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("HTTP/1.1".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::HTTP_11);
        assert_eq!("HTTP/2.0".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::HTTP_2);
        assert_eq!("HTTP/2".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::HTTP_2);
        assert!("HTTP/x.1".parse::<ProtocolVersion>().is_err());
        assert!("SPDY/3".parse::<ProtocolVersion>().is_err());
        assert_eq!(
            "SPDY/3".parse::<ProtocolVersion>().unwrap_err().to_string(),
            r#"invalid protocol version: "SPDY/3""#
        );
    }

    #[test]
    fn test_from_parts_keeps_raw_head() {
        let (parts, ()) = axum::http::Request::builder()
            .method(Method::PUT)
            .uri("/files/a?v=2")
            .header(X_REQUEST_ID, "rid-1")
            .body(())
            .unwrap()
            .into_parts();
        let remote: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let request = Request::from_parts(parts, Bytes::from_static(b"data"), remote);

        assert_eq!(request.path(), "/files/a");
        assert_eq!(request.query("v"), Some("2"));
        assert_eq!(request.request_id(), Some("rid-1"));
        assert_eq!(request.body().as_ref(), b"data");

        let raw = request.raw_http().unwrap();
        assert_eq!(raw.method, Method::PUT);
        assert_eq!(raw.uri, "/files/a?v=2");
        assert_eq!(raw.headers[X_REQUEST_ID], "rid-1");
        assert!(request.raw_gateway().is_none());
    }

    #[test]
    fn test_query_decoding() {
        let request = Request::new(Method::GET, "/search", Transport::Socket)
            .with_query("q=hello+world&tag=a&tag=b&empty=");
        assert_eq!(request.query("q"), Some("hello world"));
        assert_eq!(request.query("tag"), Some("a"));
        assert_eq!(request.query("empty"), Some(""));
        assert_eq!(request.query_pairs().len(), 4);
    }

    #[test]
    fn test_cookies_from_headers() {
        let request = request_with(&[("cookie", "a=1; b=2"), ("cookie", "c=3")]);
        assert_eq!(request.cookies().len(), 3);
        assert_eq!(request.cookie("b").map(|c| c.value.as_str()), Some("2"));
        assert!(request.cookie("z").is_none());
    }

    #[test]
    fn test_scheme() {
        assert_eq!(request_with(&[]).scheme(), "http");
        assert_eq!(request_with(&[("x-forwarded-proto", "https")]).scheme(), "https");
        assert_eq!(request_with(&[("x-forwarded-ssl", "on")]).scheme(), "https");
        assert_eq!(request_with(&[("x-url-scheme", "wss")]).scheme(), "wss");
    }

    #[test]
    fn test_real_ip() {
        assert_eq!(request_with(&[]).real_ip(), "10.0.0.9");
        assert_eq!(
            request_with(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]).real_ip(),
            "203.0.113.7"
        );
        assert_eq!(request_with(&[("x-real-ip", "198.51.100.2")]).real_ip(), "198.51.100.2");

        let v6 = Request::new(Method::GET, "/", Transport::Socket).with_remote_addr("[::1]:8080");
        assert_eq!(v6.real_ip(), "::1");

        let bare = Request::new(Method::GET, "/", Transport::Gateway).with_remote_addr("192.0.2.1");
        assert_eq!(bare.real_ip(), "192.0.2.1");
    }
}
