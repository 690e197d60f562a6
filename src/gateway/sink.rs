//! Buffering response sink for gateway invocations.
//!
//! # Responsibilities
//! - Buffer status, headers, cookies and body for the whole invocation
//! - On commit, materialize exactly one `GatewayResponse`
//!
//! # Design Decisions
//! - Binary unless `Content-Type` is an exact entry of the text table; binary
//!   bodies (and text bodies that are not valid UTF-8) are base64-encoded
//! - A header with one value goes to `headers`, several to `multiValueHeaders`
//! - `Set-Cookie` headers are moved to `cookies`, after explicitly set cookies
//! - Header names come out lowercase, as stored by `HeaderMap`

use std::collections::BTreeMap;
use std::io;

use axum::http::{header, HeaderMap, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::event::GatewayResponse;
use crate::http::{mime, CommitError, Cookie, ResponseSink};

#[derive(Debug, Default)]
pub struct BufferedSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    cookies: Vec<String>,
    body: Vec<u8>,
    output: Option<GatewayResponse>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed response, if any.
    pub fn output(&self) -> Option<&GatewayResponse> {
        self.output.as_ref()
    }

    pub fn into_output(self) -> Option<GatewayResponse> {
        self.output
    }

    fn is_text(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(mime::is_text)
    }

    fn materialize(&mut self) -> GatewayResponse {
        let body = std::mem::take(&mut self.body);
        let (body, is_base64_encoded) = if self.is_text() {
            match String::from_utf8(body) {
                Ok(text) => (text, false),
                Err(err) => (STANDARD.encode(err.into_bytes()), true),
            }
        } else {
            (STANDARD.encode(&body), true)
        };

        let mut headers = BTreeMap::new();
        let mut multi_value_headers = BTreeMap::new();
        let mut cookies = std::mem::take(&mut self.cookies);

        for name in self.headers.keys() {
            let values: Vec<String> = self
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();

            if name == header::SET_COOKIE {
                cookies.extend(values);
            } else if values.len() == 1 {
                headers.insert(name.as_str().to_string(), values.concat());
            } else {
                multi_value_headers.insert(name.as_str().to_string(), values);
            }
        }

        GatewayResponse {
            status_code: self.status.unwrap_or(StatusCode::OK).as_u16(),
            headers,
            multi_value_headers,
            cookies,
            body,
            is_base64_encoded,
        }
    }
}

impl ResponseSink for BufferedSink {
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
    }

    fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie.to_header_value());
    }

    fn commit(&mut self) -> Result<(), CommitError> {
        if self.output.is_some() {
            return Err(CommitError::AlreadyCommitted);
        }
        let response = self.materialize();
        self.output = Some(response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn content_type(sink: &mut BufferedSink, value: &'static str) {
        sink.headers()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }

    #[test]
    fn test_defaults_to_200() {
        let mut sink = BufferedSink::new();
        sink.commit().unwrap();
        let out = sink.output().unwrap();
        assert_eq!(out.status_code, 200);
        assert_eq!(out.body, "");
    }

    #[test]
    fn test_commit_is_idempotent() {
        let mut sink = BufferedSink::new();
        content_type(&mut sink, "text/plain");
        sink.write_status(StatusCode::CREATED);
        sink.write(b"first").unwrap();
        sink.commit().unwrap();
        let first = sink.output().cloned().unwrap();

        sink.write(b" more").unwrap();
        sink.write_status(StatusCode::BAD_REQUEST);
        assert_eq!(sink.commit(), Err(CommitError::AlreadyCommitted));
        assert_eq!(sink.output(), Some(&first));
        assert_eq!(first.status_code, 201);
        assert_eq!(first.body, "first");
    }

    #[test]
    fn test_json_is_not_base64() {
        let mut sink = BufferedSink::new();
        content_type(&mut sink, "application/json; charset=UTF-8");
        sink.write(br#"{"ok":true}"#).unwrap();
        sink.commit().unwrap();

        let out = sink.into_output().unwrap();
        assert!(!out.is_base64_encoded);
        assert_eq!(out.body, r#"{"ok":true}"#);
    }

    #[test]
    fn test_binary_round_trip() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

        let mut sink = BufferedSink::new();
        content_type(&mut sink, "image/png");
        sink.write(&png).unwrap();
        sink.commit().unwrap();
        let out = sink.into_output().unwrap();
        assert!(out.is_base64_encoded);
        assert_eq!(STANDARD.decode(&out.body).unwrap(), png);

        let mut sink = BufferedSink::new();
        sink.write(b"no content type").unwrap();
        sink.commit().unwrap();
        let out = sink.into_output().unwrap();
        assert!(out.is_base64_encoded);
        assert_eq!(STANDARD.decode(&out.body).unwrap(), b"no content type");
    }

    #[test]
    fn test_invalid_utf8_text_is_base64() {
        let mut sink = BufferedSink::new();
        content_type(&mut sink, "text/plain");
        sink.write(&[0xff, 0xfe]).unwrap();
        sink.commit().unwrap();
        let out = sink.into_output().unwrap();
        assert!(out.is_base64_encoded);
        assert_eq!(STANDARD.decode(&out.body).unwrap(), [0xff, 0xfe]);
    }

    #[test]
    fn test_header_folding() {
        let mut sink = BufferedSink::new();
        sink.headers().insert("x-single", HeaderValue::from_static("one"));
        sink.headers().append("x-multi", HeaderValue::from_static("a"));
        sink.headers().append("x-multi", HeaderValue::from_static("b"));
        sink.commit().unwrap();

        let out = sink.into_output().unwrap();
        assert_eq!(out.headers.get("x-single").map(String::as_str), Some("one"));
        assert!(!out.headers.contains_key("x-multi"));
        assert_eq!(out.multi_value_headers["x-multi"], vec!["a", "b"]);
        assert!(!out.multi_value_headers.contains_key("x-single"));
    }

    #[test]
    fn test_cookie_folding() {
        let mut sink = BufferedSink::new();
        sink.set_cookie(Cookie::new("explicit", "1"));
        sink.headers()
            .append(header::SET_COOKIE, HeaderValue::from_static("raw=2"));
        sink.headers()
            .append(header::SET_COOKIE, HeaderValue::from_static("raw2=3; Path=/"));
        sink.commit().unwrap();

        let out = sink.into_output().unwrap();
        assert_eq!(out.cookies, vec!["explicit=1", "raw=2", "raw2=3; Path=/"]);
        assert!(!out.headers.contains_key("set-cookie"));
        assert!(!out.multi_value_headers.contains_key("set-cookie"));
    }
}
