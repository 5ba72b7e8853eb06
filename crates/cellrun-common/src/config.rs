//! Engine configuration surface.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_execution_time() -> u64 {
    30
}

fn default_max_memory_mb() -> u64 {
    512
}

/// Configuration consumed by the execution core.
///
/// The resource limiter enforces its own 60-second ceiling regardless of
/// what is configured here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default wall-clock budget per execution in seconds.
    #[serde(default = "default_max_execution_time")]
    pub max_execution_time_secs: u64,
    /// Default memory ceiling per execution in MiB.
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_execution_time_secs: default_max_execution_time(),
            max_memory_mb: default_max_memory_mb(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `MAX_EXECUTION_TIME` (seconds) and `MAX_MEMORY_MB`; unset or
    /// unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            max_execution_time_secs: read_env("MAX_EXECUTION_TIME")
                .unwrap_or_else(default_max_execution_time),
            max_memory_mb: read_env("MAX_MEMORY_MB").unwrap_or_else(default_max_memory_mb),
        }
    }

    /// The default execution budget as a `Duration`.
    pub fn max_execution_time(&self) -> Duration {
        Duration::from_secs(self.max_execution_time_secs)
    }

    /// The default memory ceiling in docker format, e.g. `"512m"`.
    pub fn memory_limit(&self) -> String {
        format!("{}m", self.max_memory_mb)
    }
}

fn read_env(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}
