//! Per-route method dispatch.
//!
//! # Responsibilities
//! - Map an HTTP method (or "any") to a handler entry
//! - Resolve exact method first, then the "any" fallback
//!
//! # Design Decisions
//! - The nine standard methods and "any" live in a fixed array indexed by
//!   `Slot`; lookups on the common path never allocate or hash
//! - Extension methods (e.g. `PROPFIND`) go to an overflow map

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use super::RouteError;

/// Which methods a registration applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodSpec {
    /// Matches every method that has no exact entry.
    Any,
    Exact(Method),
}

impl MethodSpec {
    /// Parse a method specifier. `*` (or an empty string) means any method.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        match raw {
            "*" | "" => Ok(MethodSpec::Any),
            other => Method::from_bytes(other.as_bytes())
                .map(MethodSpec::Exact)
                .map_err(|_| RouteError::InvalidMethod(other.to_string())),
        }
    }
}

impl From<Method> for MethodSpec {
    fn from(method: Method) -> Self {
        MethodSpec::Exact(method)
    }
}

impl fmt::Display for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSpec::Any => write!(f, "*"),
            MethodSpec::Exact(method) => write!(f, "{}", method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Any = 0,
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
}

const SLOT_COUNT: usize = 10;

const SLOT_ORDER: [Slot; SLOT_COUNT] = [
    Slot::Any,
    Slot::Get,
    Slot::Head,
    Slot::Post,
    Slot::Put,
    Slot::Patch,
    Slot::Delete,
    Slot::Connect,
    Slot::Options,
    Slot::Trace,
];

impl Slot {
    fn of(method: &Method) -> Option<Slot> {
        match method.as_str() {
            "GET" => Some(Slot::Get),
            "HEAD" => Some(Slot::Head),
            "POST" => Some(Slot::Post),
            "PUT" => Some(Slot::Put),
            "PATCH" => Some(Slot::Patch),
            "DELETE" => Some(Slot::Delete),
            "CONNECT" => Some(Slot::Connect),
            "OPTIONS" => Some(Slot::Options),
            "TRACE" => Some(Slot::Trace),
            _ => None,
        }
    }

    fn spec(self) -> MethodSpec {
        match self {
            Slot::Any => MethodSpec::Any,
            Slot::Get => MethodSpec::Exact(Method::GET),
            Slot::Head => MethodSpec::Exact(Method::HEAD),
            Slot::Post => MethodSpec::Exact(Method::POST),
            Slot::Put => MethodSpec::Exact(Method::PUT),
            Slot::Patch => MethodSpec::Exact(Method::PATCH),
            Slot::Delete => MethodSpec::Exact(Method::DELETE),
            Slot::Connect => MethodSpec::Exact(Method::CONNECT),
            Slot::Options => MethodSpec::Exact(Method::OPTIONS),
            Slot::Trace => MethodSpec::Exact(Method::TRACE),
        }
    }
}

/// Fixed-slot method table with an overflow map for extension methods.
#[derive(Debug)]
pub struct DispatchTable<T> {
    slots: [Option<T>; SLOT_COUNT],
    others: HashMap<Method, T>,
}

impl<T> Default for DispatchTable<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            others: HashMap::new(),
        }
    }
}

impl<T> DispatchTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry, returning the one it replaced.
    pub fn insert(&mut self, spec: MethodSpec, entry: T) -> Option<T> {
        match spec {
            MethodSpec::Any => self.slots[Slot::Any as usize].replace(entry),
            MethodSpec::Exact(method) => match Slot::of(&method) {
                Some(slot) => self.slots[slot as usize].replace(entry),
                None => self.others.insert(method, entry),
            },
        }
    }

    /// Entry registered for exactly this spec, without fallback.
    pub fn get(&self, spec: &MethodSpec) -> Option<&T> {
        match spec {
            MethodSpec::Any => self.slots[Slot::Any as usize].as_ref(),
            MethodSpec::Exact(method) => self.exact(method),
        }
    }

    fn exact(&self, method: &Method) -> Option<&T> {
        match Slot::of(method) {
            Some(slot) => self.slots[slot as usize].as_ref(),
            None => self.others.get(method),
        }
    }

    pub fn remove(&mut self, spec: &MethodSpec) -> Option<T> {
        match spec {
            MethodSpec::Any => self.slots[Slot::Any as usize].take(),
            MethodSpec::Exact(method) => match Slot::of(method) {
                Some(slot) => self.slots[slot as usize].take(),
                None => self.others.remove(method),
            },
        }
    }

    /// Resolve a request method: exact entry, else the "any" entry.
    pub fn resolve(&self, method: &Method) -> Option<&T> {
        self.exact(method)
            .or_else(|| self.slots[Slot::Any as usize].as_ref())
    }

    /// Number of populated method entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populated method specs, standard slots first.
    pub fn specs(&self) -> Vec<MethodSpec> {
        let mut specs: Vec<MethodSpec> = SLOT_ORDER
            .iter()
            .filter(|slot| self.slots[**slot as usize].is_some())
            .map(|slot| slot.spec())
            .collect();
        specs.extend(self.others.keys().cloned().map(MethodSpec::Exact));
        specs
    }
}
