//! # cellrun-executor
//!
//! The one-shot, fully isolated compile-and-run path of the cellrun
//! execution core. Each request gets its own ephemeral container with
//! networking disabled and CPU/memory/time ceilings applied; the container
//! is torn down unconditionally once the result is collected, on every
//! path.
//!
//! The Docker backend sits behind the [`ContainerRuntime`] trait so the
//! executor's lifecycle guarantees are testable without a daemon.

mod error;
mod executor;
mod limits;
mod manager;
mod output;
mod runtime;
#[cfg(test)]
pub(crate) mod testutil;

pub use error::{ExecutorError, Result};
pub use executor::{Executor, ExecutorConfig, COMPILE_FAILURE_EXIT};
pub use limits::{ResourceLimits, MAX_CPU_QUOTA, MAX_TIMEOUT_SECS};
pub use manager::{ContainerManager, SandboxInstance};
pub use output::{OutputCollector, STDERR_MARKER, TRUNCATION_MARKER};
pub use runtime::{ContainerRuntime, ContainerSpec, DockerRuntime};
