//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the whole per-request pipeline with one deadline
//! - Cancel the pipeline (dropping the outbound client) when it fires
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;

use crate::error::{ProxyError, TransportError};

/// Run `pipeline`, failing with `DeadlineExceeded` after `secs` seconds.
pub async fn with_deadline<F, T>(secs: u64, pipeline: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), pipeline).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::DeadlineExceeded(secs).into()),
    }
}
