//! Route table backed by a segment trie.
//!
//! # Responsibilities
//! - Store registered routes, one trie node per path segment
//! - Look up the route for a request path
//! - Remove single method entries and prune empty branches
//!
//! # Design Decisions
//! - Precedence at every depth: literal > named wildcard > greedy wildcard
//! - A greedy child is remembered as the fallback before a segment is
//!   consumed below its parent, so a greedy match always covers at least
//!   one segment; the deepest remembered candidate wins
//! - No backtracking: once a literal child is taken, a sibling wildcard is
//!   not retried (only the greedy fallback is)
//! - Conflicts are checked before the trie is touched, so a rejected
//!   registration leaves the table unchanged

use std::collections::HashMap;

use super::dispatch::{DispatchTable, MethodSpec};
use super::pattern::{split_path, Capture, RoutePattern, Segment};
use super::RouteError;

/// A handler together with the capture plan of the pattern it was
/// registered under.
#[derive(Debug, Clone)]
pub struct HandlerEntry<H> {
    pub handler: H,
    pub captures: Vec<Capture>,
}

/// A registered path and its per-method entries.
#[derive(Debug)]
pub struct Route<H> {
    path: String,
    dispatch: DispatchTable<HandlerEntry<H>>,
}

impl<H> Route<H> {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            dispatch: DispatchTable::new(),
        }
    }

    /// The pattern this route was first registered with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dispatch(&self) -> &DispatchTable<HandlerEntry<H>> {
        &self.dispatch
    }

    /// Entry for the request method, falling back to the "any" entry.
    pub fn entry(&self, method: &axum::http::Method) -> Option<&HandlerEntry<H>> {
        self.dispatch.resolve(method)
    }
}

#[derive(Debug)]
struct Wildcard<H> {
    key: String,
    node: RouteNode<H>,
}

impl<H> Wildcard<H> {
    fn new(key: &str) -> Box<Self> {
        Box::new(Self {
            key: key.to_string(),
            node: RouteNode::new(),
        })
    }
}

#[derive(Debug)]
struct RouteNode<H> {
    children: HashMap<String, RouteNode<H>>,
    named: Option<Box<Wildcard<H>>>,
    greedy: Option<Box<Wildcard<H>>>,
    route: Option<Route<H>>,
}

impl<H> RouteNode<H> {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            named: None,
            greedy: None,
            route: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.route.is_none()
            && self.children.is_empty()
            && self.named.is_none()
            && self.greedy.is_none()
    }
}

/// The route table. Built during setup, then shared read-only.
#[derive(Debug)]
pub struct RouteTable<H> {
    root: RouteNode<H>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            root: RouteNode::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `spec` on `path`.
    ///
    /// An existing entry for the same method on the same path is replaced.
    pub fn add_route(&mut self, spec: MethodSpec, path: &str, handler: H) -> Result<(), RouteError> {
        let pattern = RoutePattern::parse(path)?;
        self.check_conflicts(&pattern, path)?;

        let mut cur = &mut self.root;
        for segment in pattern.segments() {
            cur = match segment {
                Segment::Literal(text) => cur.children.entry(text.clone()).or_insert_with(RouteNode::new),
                Segment::Named(key) => &mut cur.named.get_or_insert_with(|| Wildcard::new(key)).node,
                Segment::Greedy(key) => &mut cur.greedy.get_or_insert_with(|| Wildcard::new(key)).node,
            };
        }

        let route = cur.route.get_or_insert_with(|| Route::new(path));
        let replaced = route.dispatch.insert(
            spec.clone(),
            HandlerEntry {
                handler,
                captures: pattern.captures(),
            },
        );

        if replaced.is_some() {
            tracing::debug!(method = %spec, path = %path, "Route handler replaced");
        }
        Ok(())
    }

    fn check_conflicts(&self, pattern: &RoutePattern, path: &str) -> Result<(), RouteError> {
        let mut cur = &self.root;
        for segment in pattern.segments() {
            let next = match segment {
                Segment::Literal(text) => cur.children.get(text),
                Segment::Named(key) => existing_wildcard(&cur.named, key, path)?,
                Segment::Greedy(key) => existing_wildcard(&cur.greedy, key, path)?,
            };
            match next {
                Some(node) => cur = node,
                None => break,
            }
        }
        Ok(())
    }

    /// Find the route for a request path.
    pub fn find_route(&self, path: &str) -> Option<&Route<H>> {
        let mut cur = &self.root;
        let mut fallback: Option<&Route<H>> = None;

        for segment in split_path(path) {
            if let Some(route) = cur.greedy.as_ref().and_then(|w| w.node.route.as_ref()) {
                fallback = Some(route);
            }

            let next = cur
                .children
                .get(segment)
                .or_else(|| cur.named.as_ref().map(|w| &w.node));

            match next {
                Some(node) => cur = node,
                None => return fallback,
            }
        }

        cur.route.as_ref().or(fallback)
    }

    /// Remove the entry for `spec` on `path`. Returns whether one existed.
    pub fn del_route(&mut self, spec: &MethodSpec, path: &str) -> bool {
        let Ok(pattern) = RoutePattern::parse(path) else {
            return false;
        };
        remove_entry(&mut self.root, pattern.segments(), spec)
    }

    /// All registered `(method, path)` pairs, sorted by path.
    pub fn routes(&self) -> Vec<(MethodSpec, String)> {
        let mut out = Vec::new();
        collect_routes(&self.root, &mut out);
        out.sort_by(|a, b| a.1.cmp(&b.1));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn existing_wildcard<'a, H>(
    slot: &'a Option<Box<Wildcard<H>>>,
    key: &str,
    path: &str,
) -> Result<Option<&'a RouteNode<H>>, RouteError> {
    match slot {
        Some(wildcard) if wildcard.key != key => Err(RouteError::WildcardConflict {
            pattern: path.to_string(),
            existing: wildcard.key.clone(),
            requested: key.to_string(),
        }),
        Some(wildcard) => Ok(Some(&wildcard.node)),
        None => Ok(None),
    }
}

fn remove_entry<H>(node: &mut RouteNode<H>, segments: &[Segment], spec: &MethodSpec) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        let Some(route) = node.route.as_mut() else {
            return false;
        };
        let removed = route.dispatch.remove(spec).is_some();
        if route.dispatch.is_empty() {
            node.route = None;
        }
        return removed;
    };

    match segment {
        Segment::Literal(text) => {
            let Some(child) = node.children.get_mut(text) else {
                return false;
            };
            let removed = remove_entry(child, rest, spec);
            if child.is_empty() {
                node.children.remove(text);
            }
            removed
        }
        Segment::Named(key) => remove_from_wildcard(&mut node.named, key, rest, spec),
        Segment::Greedy(key) => remove_from_wildcard(&mut node.greedy, key, rest, spec),
    }
}

fn remove_from_wildcard<H>(
    slot: &mut Option<Box<Wildcard<H>>>,
    key: &str,
    rest: &[Segment],
    spec: &MethodSpec,
) -> bool {
    let Some(wildcard) = slot.as_mut() else {
        return false;
    };
    if wildcard.key != key {
        return false;
    }
    let removed = remove_entry(&mut wildcard.node, rest, spec);
    if wildcard.node.is_empty() {
        *slot = None;
    }
    removed
}

fn collect_routes<H>(node: &RouteNode<H>, out: &mut Vec<(MethodSpec, String)>) {
    if let Some(route) = &node.route {
        for spec in route.dispatch.specs() {
            out.push((spec, route.path.clone()));
        }
    }
    for child in node.children.values() {
        collect_routes(child, out);
    }
    if let Some(wildcard) = &node.named {
        collect_routes(&wildcard.node, out);
    }
    if let Some(wildcard) = &node.greedy {
        collect_routes(&wildcard.node, out);
    }
}
