//! MIME types the response helpers emit, and the text allow-list used by
//! buffered transports to decide between plain and base64 bodies.

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=UTF-8";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_XML_UTF8: &str = "application/xml; charset=UTF-8";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_HTML_UTF8: &str = "text/html; charset=UTF-8";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=UTF-8";

const TEXT_TYPES: [&str; 8] = [
    APPLICATION_JSON,
    APPLICATION_JSON_UTF8,
    APPLICATION_XML,
    APPLICATION_XML_UTF8,
    TEXT_HTML,
    TEXT_HTML_UTF8,
    TEXT_PLAIN,
    TEXT_PLAIN_UTF8,
];

/// Exact match against the known-text table. Anything else, including
/// `text/css` or a differently spelled charset, counts as binary.
pub fn is_text(content_type: &str) -> bool {
    TEXT_TYPES.contains(&content_type)
}
