//! Path parameter extraction.

use std::collections::HashMap;

use super::pattern::Capture;

/// Parameters captured from the request path for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: HashMap<String, String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a capture plan to a request path.
    ///
    /// The path is split on `/` exactly as patterns are, so index 1 is the
    /// first segment. A greedy capture takes the remaining segments joined
    /// by `/` and ends extraction. Indices past the end of the path are
    /// skipped. When a pattern reuses a key the later capture wins.
    pub fn extract(path: &str, plan: &[Capture]) -> Self {
        let mut params = Self::new();
        if plan.is_empty() {
            return params;
        }

        let parts: Vec<&str> = path.split('/').collect();
        for capture in plan {
            if capture.index >= parts.len() {
                continue;
            }

            if capture.greedy {
                params.set(&capture.key, parts[capture.index..].join("/"));
                break;
            }

            params.set(&capture.key, parts[capture.index]);
        }

        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
