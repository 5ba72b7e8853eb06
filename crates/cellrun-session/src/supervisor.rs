//! Wall-clock bounding for a single operation.
//!
//! The supervisor is execution-agnostic: it knows nothing about kernels or
//! containers, only about racing an arbitrary future against a deadline.
//! On timeout the future is cancelled; cancelling whatever *process* was
//! behind it is the caller's responsibility (see [`Session`]).
//!
//! [`Session`]: crate::session::Session

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// The operation did not complete within its wall-clock budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("execution timed out after {limit:?}")]
pub struct ExecutionTimeout {
    /// The budget that was exceeded.
    pub limit: Duration,
}

/// Run `operation` with a hard wall-clock bound.
///
/// Returns the operation's output if it completes in time; errors produced
/// by the operation pass through verbatim inside that output. On timeout the
/// operation future is dropped and [`ExecutionTimeout`] is returned.
pub async fn run_with_timeout<F>(operation: F, limit: Duration) -> Result<F::Output, ExecutionTimeout>
where
    F: Future,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(output) => Ok(output),
        Err(_) => {
            warn!(limit_secs = limit.as_secs_f64(), "operation exceeded wall-clock budget");
            Err(ExecutionTimeout { limit })
        }
    }
}
