//! One-shot compile-and-run execution in an ephemeral container.

use crate::error::ExecutorError;
use crate::limits::ResourceLimits;
use crate::manager::ContainerManager;
use crate::output::OutputCollector;
use crate::runtime::{ContainerRuntime, ContainerSpec};
use cellrun_common::{EngineConfig, ExecutionRequest, ExecutionResult, ExecutionStatus, Language};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Exit code the sandbox script reserves for a failed compile step, so the
/// executor can tell compile failures from runtime failures.
pub const COMPILE_FAILURE_EXIT: i64 = 113;

/// One-shot requests are not part of a session; their sequence number is
/// always 1.
const ONE_SHOT_COUNT: u32 = 1;

const DEFAULT_IMAGE_PREFIX: &str = "cellrun";
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Knobs for the executor that do not vary per request.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Prefix of the per-language sandbox images, e.g. `cellrun-c:latest`.
    pub image_prefix: String,
    /// Ceiling on captured output per stream, in bytes.
    pub max_output_bytes: usize,
    /// Limits applied when a request carries no overrides.
    pub default_limits: ResourceLimits,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            default_limits: ResourceLimits::default(),
        }
    }
}

impl ExecutorConfig {
    /// Executor configuration with the default limits taken from the engine
    /// configuration (env-driven in deployments).
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            default_limits: ResourceLimits::from_config(config),
            ..Default::default()
        }
    }

    fn image_for(&self, language: Language) -> String {
        format!("{}-{}:latest", self.image_prefix, language)
    }
}

/// Runs one request in one ephemeral, network-disabled container.
///
/// [`Executor::execute`] is infallible by contract: every failure path,
/// including provisioning errors and timeouts, is folded into a fully
/// populated [`ExecutionResult`]. The container is removed on every path
/// once it has been created.
pub struct Executor<R: ContainerRuntime> {
    manager: ContainerManager<R>,
    config: ExecutorConfig,
    collector: OutputCollector,
}

impl<R: ContainerRuntime> Executor<R> {
    pub fn new(runtime: R) -> Self {
        Self::with_config(runtime, ExecutorConfig::default())
    }

    pub fn with_config(runtime: R, config: ExecutorConfig) -> Self {
        let collector = OutputCollector::new(config.max_output_bytes);
        Self {
            manager: ContainerManager::new(runtime),
            config,
            collector,
        }
    }

    /// The registry of instances this executor has provisioned.
    pub fn manager(&self) -> &ContainerManager<R> {
        &self.manager
    }

    /// Execute `request` in a fresh container and return its result.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();

        let mut limits = self
            .config
            .default_limits
            .clone()
            .merged(request.resource_limits.as_ref());
        // A request-level budget wins over the override block.
        if let Some(seconds) = request.timeout_seconds {
            limits.timeout_seconds = seconds;
        }
        let memory_bytes = match limits.memory_bytes() {
            Some(bytes) if limits.validate() => bytes,
            _ => {
                let err = ExecutorError::InvalidLimits(format!(
                    "cpu_quota={} memory_limit={} timeout_seconds={}",
                    limits.cpu_quota, limits.memory_limit, limits.timeout_seconds
                ));
                warn!(error = %err, "rejecting request before provisioning");
                return ExecutionResult::failed(
                    err.to_string(),
                    ONE_SHOT_COUNT,
                    started.elapsed(),
                );
            }
        };

        let spec = ContainerSpec {
            name: format!("cellrun-{}", Uuid::new_v4()),
            image: self.config.image_for(request.language),
            cmd: vec![
                "sh".to_string(),
                "-c".to_string(),
                sandbox_script(request.language),
            ],
            env: vec![
                format!("CODE={}", request.code),
                format!("STDIN={}", request.stdin),
            ],
            memory_bytes,
            cpu_quota: limits.cpu_quota,
        };

        let id = match self.manager.provision(&spec).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, image = %spec.image, "failed to provision sandbox");
                return ExecutionResult::failed(e.to_string(), ONE_SHOT_COUNT, started.elapsed());
            }
        };

        let result = self.run(&id, &limits, started).await;

        if let Err(e) = self.manager.remove(&id).await {
            warn!(container_id = %id, error = %e, "failed to tear down sandbox");
        }

        info!(
            container_id = %id,
            status = %result.status,
            exit_code = result.exit_code,
            elapsed_secs = result.execution_time_secs,
            "execution finished"
        );
        result
    }

    async fn run(&self, id: &str, limits: &ResourceLimits, started: Instant) -> ExecutionResult {
        match timeout(limits.bounded_timeout(), self.manager.runtime().wait(id)).await {
            Ok(Ok(exit_code)) => {
                let raw = match self.manager.runtime().logs(id).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(container_id = %id, error = %e, "failed to fetch logs");
                        return ExecutionResult::failed(
                            e.to_string(),
                            ONE_SHOT_COUNT,
                            started.elapsed(),
                        );
                    }
                };
                let (stdout, stderr) = self.collector.split(&raw);
                let status = if exit_code == 0 {
                    ExecutionStatus::Ok
                } else {
                    ExecutionStatus::Error
                };
                if exit_code == COMPILE_FAILURE_EXIT {
                    debug!(container_id = %id, "compile step failed");
                }
                ExecutionResult {
                    stdout: self.collector.collect(&stdout),
                    stderr: self.collector.collect(&stderr),
                    status,
                    execution_count: ONE_SHOT_COUNT,
                    exit_code,
                    execution_time_secs: started.elapsed().as_secs_f64(),
                }
            }
            Ok(Err(e)) => {
                warn!(container_id = %id, error = %e, "wait failed");
                ExecutionResult::failed(e.to_string(), ONE_SHOT_COUNT, started.elapsed())
            }
            Err(_) => {
                warn!(
                    container_id = %id,
                    budget_secs = limits.bounded_timeout().as_secs(),
                    "execution exceeded its budget, killing instance"
                );
                if let Err(e) = self.manager.runtime().kill(id).await {
                    warn!(container_id = %id, error = %e, "failed to kill instance");
                }
                ExecutionResult::timed_out(ONE_SHOT_COUNT, started.elapsed())
            }
        }
    }
}

/// The script run as pid 1 inside the sandbox: write the source from the
/// environment, compile, then run with the request's stdin piped in.
fn sandbox_script(language: Language) -> String {
    let (source, compile) = match language {
        Language::C => (
            "/tmp/source.c",
            "gcc -Wall -Wextra /tmp/source.c -o /tmp/program",
        ),
        Language::Cpp => (
            "/tmp/source.cpp",
            "g++ -Wall -Wextra -std=c++17 /tmp/source.cpp -o /tmp/program",
        ),
    };
    format!(
        "set -e\n\
         printf '%s' \"$CODE\" > {source}\n\
         {compile} || exit {COMPILE_FAILURE_EXIT}\n\
         printf '%s' \"$STDIN\" | /tmp/program\n"
    )
}
