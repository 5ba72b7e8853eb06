//! Error types for the kernel layer.

use thiserror::Error;

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors that can occur while driving an interpreter process.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The interpreter process is not in the `Running` state.
    #[error("kernel process is not running")]
    NotRunning,

    /// The interpreter could not be spawned or came up without its pipes.
    #[error("failed to spawn interpreter: {0}")]
    Spawn(String),

    /// The ready prompt was never observed on the output stream.
    #[error("interpreter protocol violated: {0}")]
    Protocol(String),

    /// A signal could not be delivered to the interpreter process.
    #[error("failed to deliver signal: {0}")]
    Signal(String),

    /// I/O error on the interpreter's pipes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// True for failures that leave the kernel unusable and require the
    /// owning session to replace it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KernelError::Protocol(_) | KernelError::Io(_) | KernelError::Spawn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        assert!(KernelError::Protocol("eof".into()).is_fatal());
        assert!(KernelError::Spawn("enoent".into()).is_fatal());
        assert!(!KernelError::NotRunning.is_fatal());
        assert!(!KernelError::Signal("esrch".into()).is_fatal());
    }
}
