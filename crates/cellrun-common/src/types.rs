//! Domain types for execution requests and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Canonical message placed in `stderr` when an execution times out.
pub const TIMEOUT_MESSAGE: &str = "Execution timed out";

/// Language of a submitted execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C, compiled with gcc.
    C,
    /// C++, compiled with g++.
    Cpp,
}

impl Language {
    /// The identifier used in requests and image names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a language identifier is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Caller-supplied overrides for the executor's resource limits.
///
/// All fields are optional; the resource limiter merges them onto its
/// defaults and validates the merged set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitOverrides {
    /// CPU quota in microshares of one core (100_000 = one full core).
    pub cpu_quota: Option<i64>,
    /// Memory ceiling in docker format, e.g. `"512m"`.
    pub memory_limit: Option<String>,
    /// Wall-clock budget in seconds.
    pub timeout_seconds: Option<u64>,
}

/// A single code execution request. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Source code to compile and/or run.
    pub code: String,
    /// Language of the source code.
    pub language: Language,
    /// Data piped to the program's stdin (executor path only).
    #[serde(default)]
    pub stdin: String,
    /// Wall-clock budget in seconds; falls back to the configured default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Resource-limit overrides for the executor path.
    #[serde(default)]
    pub resource_limits: Option<LimitOverrides>,
}

impl ExecutionRequest {
    /// Create a request with defaults for stdin, timeout, and limits.
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        Self {
            code: code.into(),
            language,
            stdin: String::new(),
            timeout_seconds: None,
            resource_limits: None,
        }
    }

    /// Attach stdin data.
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Set the wall-clock budget in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Attach resource-limit overrides.
    pub fn with_limits(mut self, limits: LimitOverrides) -> Self {
        self.resource_limits = Some(limits);
        self
    }
}

/// Outcome classification of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Completed without failure.
    Ok,
    /// Compile or runtime failure.
    Error,
    /// Wall-clock budget exceeded.
    Timeout,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Ok => write!(f, "ok"),
            ExecutionStatus::Error => write!(f, "error"),
            ExecutionStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// Structured result of one execution. Produced exactly once per request
/// and never partially populated: every failure path still fills every
/// field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (or a human-readable failure message).
    pub stderr: String,
    /// Outcome classification.
    pub status: ExecutionStatus,
    /// Sequence number within the owning session (1 for one-shot requests).
    pub execution_count: u32,
    /// Process exit code; `-1` when no process completed.
    pub exit_code: i64,
    /// Wall-clock elapsed time in seconds.
    pub execution_time_secs: f64,
}

impl ExecutionResult {
    /// Result for an execution that exceeded its wall-clock budget.
    pub fn timed_out(execution_count: u32, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: TIMEOUT_MESSAGE.to_string(),
            status: ExecutionStatus::Timeout,
            execution_count,
            exit_code: -1,
            execution_time_secs: elapsed.as_secs_f64(),
        }
    }

    /// Result for an execution that failed before producing output.
    pub fn failed(message: impl Into<String>, execution_count: u32, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            status: ExecutionStatus::Error,
            execution_count,
            exit_code: -1,
            execution_time_secs: elapsed.as_secs_f64(),
        }
    }

    /// True when the execution completed without failure.
    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trip() {
        assert_eq!("cpp".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("C".parse::<Language>().unwrap(), Language::C);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert!("rust".parse::<Language>().is_err());
        assert_eq!(Language::Cpp.to_string(), "cpp");
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: ExecutionRequest =
            serde_json::from_str(r#"{"code": "int x;", "language": "cpp"}"#).unwrap();
        assert_eq!(req.language, Language::Cpp);
        assert!(req.stdin.is_empty());
        assert!(req.timeout_seconds.is_none());
        assert!(req.resource_limits.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Timeout).unwrap(),
            r#""timeout""#
        );
    }

    #[test]
    fn test_timed_out_result_shape() {
        let result = ExecutionResult::timed_out(3, Duration::from_secs(3));
        assert_eq!(result.status, ExecutionStatus::Timeout);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, TIMEOUT_MESSAGE);
        assert_eq!(result.execution_count, 3);
        assert_eq!(result.exit_code, -1);
    }

    #[test]
    fn test_request_builder() {
        let req = ExecutionRequest::new("int main(){}", Language::C)
            .with_stdin("42")
            .with_timeout(5);
        assert_eq!(req.stdin, "42");
        assert_eq!(req.timeout_seconds, Some(5));
    }
}
