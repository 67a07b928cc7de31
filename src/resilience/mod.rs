//! Resilience subsystem.
//!
//! One inbound request yields exactly one outbound attempt: there is no
//! retry, backoff or circuit breaking. The only guard is a per-request
//! deadline so a silent upstream cannot pin a task forever.

pub mod timeouts;

pub use timeouts::with_deadline;
