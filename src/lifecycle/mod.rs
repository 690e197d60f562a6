//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build engine → Select transport → Bind / connect → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Server stops accepting and drains / runtime loop stops polling
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then engine, then transport
//! - The transport is selected once and never changes for the process

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Launcher, StartupError};
