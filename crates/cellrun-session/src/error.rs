//! Error types for the session layer.

use cellrun_kernel::KernelError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while managing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying kernel failed.
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// No kernel factory is registered for the requested language.
    #[error("no kernel registered for language: {0}")]
    UnknownLanguage(String),
}
