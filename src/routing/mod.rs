//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup phase):
//!     (method, "/users/{id}/files/{rest+}", handler)
//!     → pattern.rs (segment descriptors + capture plan)
//!     → tree.rs (walk/create trie nodes)
//!     → dispatch.rs (store entry in the route's method table)
//!
//! Request:
//!     path → tree.rs (find_route) → dispatch.rs (exact method, else any)
//!          → params.rs (apply capture plan to the path)
//! ```
//!
//! # Design Decisions
//! - Registration needs `&mut`, lookups only `&`: the table is built once and
//!   then shared read-only across requests
//! - Configuration mistakes are returned as `RouteError` at registration time
//! - Deterministic: literal > named > greedy at every depth

pub mod dispatch;
pub mod params;
pub mod pattern;
pub mod tree;

use thiserror::Error;

pub use dispatch::{DispatchTable, MethodSpec};
pub use params::PathParams;
pub use pattern::{Capture, RoutePattern, Segment};
pub use tree::{HandlerEntry, Route, RouteTable};

/// Route registration errors. All of them are configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// `{name+}` used before the last segment.
    #[error("greedy wildcard must be the last segment: {pattern}")]
    GreedyNotLast { pattern: String },

    /// `{}` or `{+}`.
    #[error("wildcard segment without a name: {segment}")]
    EmptyWildcardKey { segment: String },

    /// Two different wildcard names at the same trie position.
    #[error("wildcard {{{requested}}} in {pattern} conflicts with existing {{{existing}}}")]
    WildcardConflict {
        pattern: String,
        existing: String,
        requested: String,
    },

    #[error("invalid method: {0}")]
    InvalidMethod(String),
}
