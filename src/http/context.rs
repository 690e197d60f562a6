//! Per-request context handed to handlers and middleware.

use std::io::{self, Read, Write};

use axum::http::{header, request::Parts, Extensions, HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::cookie::Cookie;
use super::error::HandlerError;
use super::handler::HandlerResult;
use super::mime;
use super::request::Request;
use super::response::Response;
use crate::gateway::GatewayRequest;
use crate::routing::PathParams;

/// Indent used by `json_pretty` and `xml_pretty`.
pub const DEFAULT_INDENT: &str = "\t";

/// Prolog written before every XML body.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Request, response, path parameters and request-scoped values.
pub struct Context<'a> {
    request: Request,
    response: Response<'a>,
    params: PathParams,
    route: Option<String>,
    extensions: Extensions,
}

impl<'a> Context<'a> {
    pub fn new(
        request: Request,
        response: Response<'a>,
        params: PathParams,
        route: Option<String>,
    ) -> Self {
        Self {
            request,
            response,
            params,
            route,
            extensions: Extensions::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response<'a> {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response<'a> {
        &mut self.response
    }

    /// The registered pattern that matched, `None` on the not-found path.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query(key)
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.request.cookie(name)
    }

    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.response.set_cookie(cookie);
    }

    pub fn scheme(&self) -> &str {
        self.request.scheme()
    }

    pub fn real_ip(&self) -> &str {
        self.request.real_ip()
    }

    /// Original request head on the live socket.
    pub fn raw_http(&self) -> Option<&Parts> {
        self.request.raw_http()
    }

    /// Original gateway event.
    pub fn raw_gateway(&self) -> Option<&GatewayRequest> {
        self.request.raw_gateway()
    }

    /// Store a request-scoped value, replacing any previous value of `T`.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Status only, empty body.
    pub fn no_content(&mut self, status: StatusCode) -> HandlerResult {
        self.response.write_status(status);
        Ok(())
    }

    pub fn text(&mut self, status: StatusCode, body: &str) -> HandlerResult {
        self.result(status, mime::TEXT_PLAIN_UTF8, body.as_bytes())
    }

    pub fn html(&mut self, status: StatusCode, body: &str) -> HandlerResult {
        self.result(status, mime::TEXT_HTML_UTF8, body.as_bytes())
    }

    /// Serialize `value` as JSON straight into the response.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> HandlerResult {
        self.set_content_type(mime::APPLICATION_JSON_UTF8);
        self.response.write_status(status);
        serde_json::to_writer(&mut self.response, value)?;
        Ok(())
    }

    pub fn json_pretty<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> HandlerResult {
        self.json_with_indent(status, value, DEFAULT_INDENT)
    }

    pub fn json_with_indent<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
        indent: &str,
    ) -> HandlerResult {
        self.set_content_type(mime::APPLICATION_JSON_UTF8);
        self.response.write_status(status);
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut self.response, formatter);
        value.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn json_bytes(&mut self, status: StatusCode, body: &[u8]) -> HandlerResult {
        self.result(status, mime::APPLICATION_JSON_UTF8, body)
    }

    /// Serialize `value` as XML. The root element is named after the type.
    /// Nothing is written when serialization fails.
    pub fn xml<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> HandlerResult {
        let body = render_xml(value, None)?;
        self.xml_bytes(status, body.as_bytes())
    }

    pub fn xml_pretty<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> HandlerResult {
        self.xml_with_indent(status, value, '\t', 1)
    }

    /// Like `xml`, indenting each level with `size` copies of `indent`.
    pub fn xml_with_indent<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
        indent: char,
        size: usize,
    ) -> HandlerResult {
        let body = render_xml(value, Some((indent, size)))?;
        self.xml_bytes(status, body.as_bytes())
    }

    /// Pre-encoded XML, prefixed with `XML_HEADER`.
    pub fn xml_bytes(&mut self, status: StatusCode, body: &[u8]) -> HandlerResult {
        self.set_content_type(mime::APPLICATION_XML_UTF8);
        self.response.write_status(status);
        self.response.write_all(XML_HEADER.as_bytes())?;
        self.response.write_all(body)?;
        Ok(())
    }

    /// Write a body with a content type. An existing `Content-Type` header
    /// is kept.
    pub fn result(&mut self, status: StatusCode, content_type: &str, body: &[u8]) -> HandlerResult {
        self.result_stream(status, content_type, body)
    }

    /// Copy `reader` into the response until EOF. On the live socket the
    /// body streams out as it is read.
    pub fn result_stream<R: Read>(
        &mut self,
        status: StatusCode,
        content_type: &str,
        mut reader: R,
    ) -> HandlerResult {
        self.set_content_type(content_type);
        self.response.write_status(status);
        io::copy(&mut reader, &mut self.response)?;
        Ok(())
    }

    /// Raw body write with whatever status and headers are already set.
    pub fn write(&mut self, body: &[u8]) -> HandlerResult {
        self.response.write_all(body).map_err(HandlerError::from)
    }

    fn set_content_type(&mut self, content_type: &str) {
        let headers = self.response.headers();
        if headers.contains_key(header::CONTENT_TYPE) {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }
}

fn render_xml<T: Serialize + ?Sized>(value: &T, indent: Option<(char, usize)>) -> Result<String, HandlerError> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    if let Some((ch, size)) = indent {
        serializer.indent(ch, size);
    }
    value
        .serialize(serializer)
        .map_err(|e| HandlerError::Other(Box::new(e)))?;
    Ok(buffer)
}
