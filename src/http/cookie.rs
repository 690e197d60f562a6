//! Cookies: request `Cookie` header parsing and `Set-Cookie` rendering.

use std::fmt;

/// SameSite attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// An HTTP cookie, either received from a client or queued for a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Max-Age in seconds. Zero or negative deletes the cookie.
    pub max_age: Option<i64>,
    /// Pre-formatted HTTP date for the Expires attribute.
    pub expires: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_expires(mut self, http_date: impl Into<String>) -> Self {
        self.expires = Some(http_date.into());
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Whether the name is a valid RFC 6265 token. Cookies with invalid
    /// names are never emitted.
    pub fn is_valid(&self) -> bool {
        is_token(&self.name) && self.value.bytes().all(is_cookie_value_byte)
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, quote_if_needed(&self.value))];

        if let Some(path) = &self.path {
            parts.push(format!("Path={}", path));
        }
        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={}", domain.trim_start_matches('.')));
        }
        if let Some(expires) = &self.expires {
            parts.push(format!("Expires={}", expires));
        }
        match self.max_age {
            Some(age) if age > 0 => parts.push(format!("Max-Age={}", age)),
            Some(_) => parts.push("Max-Age=0".to_string()),
            None => {}
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={}", same_site));
        }

        parts.join("; ")
    }

    /// Parse one `Cookie` request header value (`a=1; b=2`). Pairs with an
    /// invalid name or value are skipped.
    pub fn parse_header(line: &str) -> Vec<Cookie> {
        line.split(';')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let (name, value) = part.split_once('=').unwrap_or((part, ""));
                let name = name.trim();
                if !is_token(name) {
                    return None;
                }
                let value = unquote(value.trim())?;
                Some(Cookie::new(name, value))
            })
            .collect()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

fn is_token(raw: &str) -> bool {
    !raw.is_empty()
        && raw.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn is_cookie_value_byte(b: u8) -> bool {
    (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}

fn quote_if_needed(value: &str) -> String {
    if value.contains(' ') || value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn unquote(raw: &str) -> Option<&str> {
    let raw = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner,
        None => raw,
    };
    raw.bytes().all(is_cookie_value_byte).then_some(raw)
}
