//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → Authority → Metrics (optional) → Frontend start
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown future resolves
//!
//! Shutdown:
//!     ServerHandle::stop → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, listener last
//! - The drain itself has no deadline; each request is bounded by its own

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::run;
