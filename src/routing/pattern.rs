//! Path pattern parsing.
//!
//! # Responsibilities
//! - Split a registered pattern into segment descriptors
//! - Recognize `{name}` (one segment) and `{name+}` (rest of the path)
//! - Derive the capture plan used at request time
//!
//! # Design Decisions
//! - Segment index 0 is the empty prefix before the leading slash, so the
//!   first real segment has index 1 both here and in request extraction
//! - `/` is the zero-segment pattern
//! - A greedy wildcard anywhere but the last segment is rejected

use super::RouteError;

/// One segment of a registered pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must match the path segment exactly (case-sensitive).
    Literal(String),
    /// Captures exactly one path segment.
    Named(String),
    /// Captures this segment and everything after it, joined by `/`.
    Greedy(String),
}

/// A single entry of a capture plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Position in the `/`-split request path.
    pub index: usize,
    /// Parameter name.
    pub key: String,
    pub greedy: bool,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern such as `/users/{id}/files/{rest+}`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let raw: Vec<&str> = split_path(pattern).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (i, part) in raw.iter().enumerate() {
            let segment = parse_segment(part)?;
            if matches!(segment, Segment::Greedy(_)) && i != raw.len() - 1 {
                return Err(RouteError::GreedyNotLast {
                    pattern: pattern.to_string(),
                });
            }
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// The segment descriptors, in path order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments (0 for the root pattern).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Capture plan for this pattern.
    pub fn captures(&self) -> Vec<Capture> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| match segment {
                Segment::Literal(_) => None,
                Segment::Named(key) => Some(Capture {
                    index: i + 1,
                    key: key.clone(),
                    greedy: false,
                }),
                Segment::Greedy(key) => Some(Capture {
                    index: i + 1,
                    key: key.clone(),
                    greedy: true,
                }),
            })
            .collect()
    }
}

/// Iterate the segments of a request path or pattern, skipping the empty
/// prefix before the leading slash. The root path yields nothing.
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = if path == "/" { "" } else { path };
    path.split('/').skip(1)
}

fn parse_segment(part: &str) -> Result<Segment, RouteError> {
    let (Some(start), Some(end)) = (part.find('{'), part.find('}')) else {
        return Ok(Segment::Literal(part.to_string()));
    };
    if end < start {
        return Ok(Segment::Literal(part.to_string()));
    }

    let inner = &part[start + 1..end];
    let (key, greedy) = match inner.strip_suffix('+') {
        Some(key) => (key, true),
        None => (inner, false),
    };

    if key.is_empty() {
        return Err(RouteError::EmptyWildcardKey {
            segment: part.to_string(),
        });
    }

    Ok(if greedy {
        Segment::Greedy(key.to_string())
    } else {
        Segment::Named(key.to_string())
    })
}
