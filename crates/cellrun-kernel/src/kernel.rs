//! The kernel contract: a component driving one interpreter process.

use crate::error::Result;
use async_trait::async_trait;
use cellrun_common::ExecutionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelState {
    /// No interpreter process has been spawned yet.
    NotStarted,
    /// The interpreter is at its prompt and accepting code.
    Running,
    /// An interrupt was delivered and the prompt has not reappeared yet.
    Interrupting,
    /// The interpreter process has exited or been shut down.
    Terminated,
}

impl fmt::Display for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelState::NotStarted => write!(f, "not_started"),
            KernelState::Running => write!(f, "running"),
            KernelState::Interrupting => write!(f, "interrupting"),
            KernelState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Raw outcome of a single kernel execution, before the session stamps it
/// with a sequence number and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcome {
    /// Lines read from the interpreter before the prompt reappeared.
    pub stdout: String,
    /// Content drained from the error stream.
    pub stderr: String,
    /// `Error` iff any stderr was captured.
    ///
    /// This is a coarse heuristic, not a reliable success signal: an
    /// interpreter that prints warnings to stderr flips it. The prompt
    /// protocol exposes no exit code, so it is the best signal available
    /// on this path.
    pub status: ExecutionStatus,
}

impl RawOutcome {
    /// Classify captured streams using the stderr-presence heuristic.
    pub fn from_streams(stdout: String, stderr: String) -> Self {
        let status = if stderr.is_empty() {
            ExecutionStatus::Ok
        } else {
            ExecutionStatus::Error
        };
        Self {
            stdout,
            stderr,
            status,
        }
    }
}

/// Contract over a running interpreter/REPL process.
///
/// Exactly one kernel backs one session at a time; ownership is exclusive
/// and calls against one kernel must never overlap (`&mut self` enforces
/// this within a session).
#[async_trait]
pub trait Kernel: Send {
    /// Spawn the interpreter and block until its ready prompt is observed.
    ///
    /// The prompt is the synchronization point that makes subsequent reads
    /// well-framed. There is no internal timeout; callers bound this through
    /// the supervisor.
    async fn start(&mut self) -> Result<()>;

    /// Write `code` plus a line terminator, flush, and read output lines
    /// until the prompt reappears.
    async fn execute(&mut self, code: &str) -> Result<RawOutcome>;

    /// Deliver a cooperative interrupt to the process if it is alive.
    ///
    /// This only requests that the interpreter abort script-level work; it
    /// does not guarantee an in-flight `execute` returns.
    async fn interrupt(&mut self) -> Result<()>;

    /// Read and discard output until the prompt is next observed.
    ///
    /// Used after an abandoned execution (timeout + interrupt) to get the
    /// stream back to a well-framed state.
    async fn resync(&mut self) -> Result<()>;

    /// Terminate the interpreter process.
    async fn shutdown(&mut self) -> Result<()>;

    /// Current lifecycle state.
    fn state(&self) -> KernelState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_heuristic() {
        let quiet = RawOutcome::from_streams("15\n".into(), String::new());
        assert_eq!(quiet.status, ExecutionStatus::Ok);

        let noisy = RawOutcome::from_streams(String::new(), "warning: unused".into());
        assert_eq!(noisy.status, ExecutionStatus::Error);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(KernelState::Running.to_string(), "running");
        assert_eq!(KernelState::Interrupting.to_string(), "interrupting");
    }
}
