//! Resource-limit validation and normalization.

use cellrun_common::{EngineConfig, LimitOverrides};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceiling on any execution budget, regardless of configuration.
pub const MAX_TIMEOUT_SECS: u64 = 60;

/// Hard ceiling on the CPU quota: 100_000 microshares = one full core.
pub const MAX_CPU_QUOTA: i64 = 100_000;

const DEFAULT_CPU_QUOTA: i64 = 50_000;
const DEFAULT_MEMORY_LIMIT: &str = "512m";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CPU/memory/time ceilings applied to one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU quota in microshares of one core (50_000 = half a core).
    pub cpu_quota: i64,
    /// Memory ceiling in docker format, e.g. `"512m"`.
    pub memory_limit: String,
    /// Wall-clock budget in seconds.
    pub timeout_seconds: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_quota: DEFAULT_CPU_QUOTA,
            memory_limit: DEFAULT_MEMORY_LIMIT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ResourceLimits {
    /// Defaults derived from the engine configuration instead of the
    /// built-in constants.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cpu_quota: DEFAULT_CPU_QUOTA,
            memory_limit: config.memory_limit(),
            timeout_seconds: config.max_execution_time_secs,
        }
    }

    /// Merge caller overrides onto these limits.
    pub fn merged(mut self, overrides: Option<&LimitOverrides>) -> Self {
        if let Some(o) = overrides {
            if let Some(cpu) = o.cpu_quota {
                self.cpu_quota = cpu;
            }
            if let Some(ref memory) = o.memory_limit {
                self.memory_limit = memory.clone();
            }
            if let Some(timeout) = o.timeout_seconds {
                self.timeout_seconds = timeout;
            }
        }
        self
    }

    /// Pure validation, no side effects and no clamping.
    ///
    /// Rejects budgets over [`MAX_TIMEOUT_SECS`], quotas over
    /// [`MAX_CPU_QUOTA`], non-positive values, and memory strings that do
    /// not parse.
    pub fn validate(&self) -> bool {
        if self.timeout_seconds == 0 || self.timeout_seconds > MAX_TIMEOUT_SECS {
            return false;
        }
        if self.cpu_quota <= 0 || self.cpu_quota > MAX_CPU_QUOTA {
            return false;
        }
        self.memory_bytes().is_some()
    }

    /// The memory ceiling in bytes, or `None` if the string is malformed.
    pub fn memory_bytes(&self) -> Option<i64> {
        parse_memory(&self.memory_limit)
    }

    /// The requested budget as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The budget actually enforced: `min(requested, hard ceiling)`.
    pub fn bounded_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.min(MAX_TIMEOUT_SECS))
    }
}

/// Parse a docker-format memory string (`"512m"`, `"1g"`, `"262144k"`, or
/// plain bytes) into bytes.
fn parse_memory(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (digits, multiplier) = match s.chars().last()? {
        'k' | 'K' => (&s[..s.len() - 1], 1024),
        'm' | 'M' => (&s[..s.len() - 1], 1024 * 1024),
        'g' | 'G' => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        '0'..='9' => (s, 1),
        _ => return None,
    };
    let value: i64 = digits.parse().ok()?;
    if value <= 0 {
        return None;
    }
    value.checked_mul(multiplier)
}
