//! Session: the persistent-state wrapper around one kernel.

use crate::error::{Result, SessionError};
use crate::supervisor::run_with_timeout;
use cellrun_common::{ExecutionResult, ExecutionStatus};
use cellrun_kernel::{Kernel, KernelFactory, KernelRegistry, KernelState, RawOutcome};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long a timed-out kernel gets to come back to its prompt after an
/// interrupt before it is replaced outright.
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// A session owns one kernel exclusively and sequences cell executions
/// against it.
///
/// Interpreter state persists across cells: variables defined in cell 1
/// remain visible in cell 2, which is why a REPL-style kernel backs the
/// session rather than a one-shot process. The `execution_count` increases
/// monotonically per cell, survives interrupts and kernel replacement, and
/// resets to 0 only on an explicit [`reset`](Session::reset).
pub struct Session {
    kernel: Box<dyn Kernel>,
    factory: KernelFactory,
    execution_count: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("execution_count", &self.execution_count)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session, constructing and starting a kernel from `factory`.
    pub async fn new(factory: KernelFactory) -> Result<Self> {
        let mut kernel = factory();
        kernel.start().await?;
        info!("session started");
        Ok(Self {
            kernel,
            factory,
            execution_count: 0,
        })
    }

    /// Create a session for `language` using the registry's factory.
    pub async fn from_registry(registry: &KernelRegistry, language: &str) -> Result<Self> {
        let factory = registry
            .factory(language)
            .ok_or_else(|| SessionError::UnknownLanguage(language.to_string()))?;
        Self::new(factory).await
    }

    /// Executions completed so far (including failed and timed-out ones).
    pub fn execution_count(&self) -> u32 {
        self.execution_count
    }

    /// State of the backing kernel.
    pub fn kernel_state(&self) -> KernelState {
        self.kernel.state()
    }

    /// Execute one cell with no wall-clock bound.
    ///
    /// Increments the execution count and stamps the result with it.
    pub async fn run_cell(&mut self, code: &str) -> Result<ExecutionResult> {
        self.execution_count += 1;
        let started = Instant::now();
        debug!(
            execution_count = self.execution_count,
            code_len = code.len(),
            "running cell"
        );
        let outcome = self.kernel.execute(code).await?;
        Ok(self.stamp(outcome, started.elapsed()))
    }

    /// Execute one cell under a wall-clock bound.
    ///
    /// This is the entry point the execution API drives. It never fails:
    /// kernel errors and timeouts are converted into well-formed results.
    /// On timeout the kernel is interrupted, given a bounded grace period to
    /// reach its prompt again, and replaced if it stays unresponsive.
    pub async fn run_cell_bounded(&mut self, code: &str, limit: Duration) -> ExecutionResult {
        self.execution_count += 1;
        let started = Instant::now();
        debug!(
            execution_count = self.execution_count,
            limit_secs = limit.as_secs_f64(),
            "running bounded cell"
        );

        match run_with_timeout(self.kernel.execute(code), limit).await {
            Ok(Ok(outcome)) => self.stamp(outcome, started.elapsed()),
            Ok(Err(e)) => {
                warn!(error = %e, "kernel failed during cell execution");
                if e.is_fatal() {
                    if let Err(replace_err) = self.replace_kernel().await {
                        error!(error = %replace_err, "kernel replacement failed");
                    }
                }
                ExecutionResult::failed(e.to_string(), self.execution_count, started.elapsed())
            }
            Err(_) => {
                info!(
                    execution_count = self.execution_count,
                    "cell timed out, recovering kernel"
                );
                self.recover_from_timeout().await;
                ExecutionResult::timed_out(self.execution_count, started.elapsed())
            }
        }
    }

    /// Shut down the kernel, start a fresh one, and zero the execution
    /// count. Idempotent.
    pub async fn reset(&mut self) -> Result<()> {
        info!("resetting session");
        self.replace_kernel().await?;
        self.execution_count = 0;
        Ok(())
    }

    /// Timeout recovery ladder: cooperative interrupt, bounded grace for the
    /// prompt to reappear, forced replacement if the kernel stays wedged.
    async fn recover_from_timeout(&mut self) {
        if let Err(e) = self.kernel.interrupt().await {
            warn!(error = %e, "interrupt delivery failed");
        }
        match run_with_timeout(self.kernel.resync(), INTERRUPT_GRACE).await {
            Ok(Ok(())) => {
                debug!("kernel responsive after interrupt, keeping it");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "kernel failed while resyncing, replacing");
                if let Err(e) = self.replace_kernel().await {
                    error!(error = %e, "kernel replacement failed");
                }
            }
            Err(_) => {
                warn!(
                    grace_secs = INTERRUPT_GRACE.as_secs_f64(),
                    "kernel unresponsive after interrupt, replacing"
                );
                if let Err(e) = self.replace_kernel().await {
                    error!(error = %e, "kernel replacement failed");
                }
            }
        }
    }

    async fn replace_kernel(&mut self) -> Result<()> {
        if let Err(e) = self.kernel.shutdown().await {
            warn!(error = %e, "kernel shutdown failed during replacement");
        }
        let mut kernel = (self.factory)();
        kernel.start().await?;
        self.kernel = kernel;
        debug!("fresh kernel started");
        Ok(())
    }

    fn stamp(&self, outcome: RawOutcome, elapsed: Duration) -> ExecutionResult {
        let exit_code = match outcome.status {
            ExecutionStatus::Ok => 0,
            _ => 1,
        };
        ExecutionResult {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            status: outcome.status,
            execution_count: self.execution_count,
            exit_code,
            execution_time_secs: elapsed.as_secs_f64(),
        }
    }
}
