//! Error types for the sandboxed executor.

use thiserror::Error;

/// Result type alias for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors that can occur on the one-shot execution path.
///
/// None of these escape [`Executor::execute`](crate::Executor::execute)
/// uncaught; every variant converts to a well-formed `ExecutionResult`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The merged resource limits failed validation.
    #[error("invalid resource limits: {0}")]
    InvalidLimits(String),

    /// The isolated instance could not be created or started.
    #[error("failed to provision sandbox instance: {0}")]
    Provisioning(String),

    /// The compiler exited non-zero inside the instance.
    #[error("compilation failed: {0}")]
    Compile(String),

    /// The compiled program exited non-zero.
    #[error("runtime failure (exit code {exit_code}): {message}")]
    Runtime { exit_code: i64, message: String },

    /// The instance did not finish within the wall-clock bound.
    #[error("execution timed out after {0} seconds")]
    Timeout(u64),

    /// No instance with this id is registered.
    #[error("sandbox instance not found: {0}")]
    NotFound(String),

    /// Error from the Docker daemon.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),
}
