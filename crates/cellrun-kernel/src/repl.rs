//! Prompt-framed driver for an external interactive interpreter.
//!
//! `ReplKernel` spawns an interpreter such as cling, waits for its ready
//! prompt, and frames each execution by reading output lines until the
//! prompt reappears. The error stream is pumped by a background task into a
//! channel and drained opportunistically after each prompt.

use crate::error::{KernelError, Result};
use crate::kernel::{Kernel, KernelState, RawOutcome};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// How long to wait for straggling stderr lines after the prompt is seen.
///
/// The error stream is a separate pipe, so a line written just before the
/// prompt may not have been pumped yet when the prompt arrives.
const STDERR_SETTLE: Duration = Duration::from_millis(20);

/// How an interpreter is launched and how its ready prompt looks.
#[derive(Debug, Clone)]
pub struct ReplSpec {
    /// Interpreter binary.
    pub program: String,
    /// Arguments passed at launch.
    pub args: Vec<String>,
    /// Token that marks a prompt line on the output stream.
    pub prompt: String,
}

impl ReplSpec {
    /// Create a spec with no arguments.
    pub fn new(program: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            prompt: prompt.into(),
        }
    }

    /// Append a launch argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The cling C/C++ interpreter.
    pub fn cling() -> Self {
        Self::new("cling", "cling>").arg("--nologo")
    }
}

/// Handles to a live interpreter process.
struct ReplProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr_rx: mpsc::UnboundedReceiver<String>,
    stderr_task: JoinHandle<()>,
}

impl ReplProcess {
    /// Read output lines until one carries the prompt token, accumulating
    /// everything before it. EOF before the prompt is a protocol violation.
    async fn read_until_prompt(&mut self, prompt: &str) -> Result<String> {
        let mut collected = String::new();
        loop {
            match self.stdout.next_line().await? {
                Some(line) if line.contains(prompt) => {
                    trace!(buffered = collected.len(), "prompt observed");
                    return Ok(collected);
                }
                Some(line) => {
                    collected.push_str(&line);
                    collected.push('\n');
                }
                None => {
                    return Err(KernelError::Protocol(
                        "output stream closed before ready prompt".into(),
                    ))
                }
            }
        }
    }

    /// Drain whatever the stderr pump has buffered, waiting a short settle
    /// window for stragglers.
    async fn drain_stderr(&mut self) -> String {
        let mut lines = Vec::new();
        while let Ok(Some(line)) = tokio::time::timeout(STDERR_SETTLE, self.stderr_rx.recv()).await
        {
            lines.push(line);
        }
        if lines.is_empty() {
            String::new()
        } else {
            let mut joined = lines.join("\n");
            joined.push('\n');
            joined
        }
    }
}

/// A kernel driving one external interactive interpreter over a
/// prompt-delimited text stream.
pub struct ReplKernel {
    spec: ReplSpec,
    process: Option<ReplProcess>,
    state: KernelState,
}

impl ReplKernel {
    /// Create a kernel for the given interpreter. No process is spawned
    /// until [`start`](Kernel::start).
    pub fn new(spec: ReplSpec) -> Self {
        Self {
            spec,
            process: None,
            state: KernelState::NotStarted,
        }
    }

    /// Create a kernel for the default cling interpreter.
    pub fn cling() -> Self {
        Self::new(ReplSpec::cling())
    }

    /// The spec this kernel was built from.
    pub fn spec(&self) -> &ReplSpec {
        &self.spec
    }

    fn spawn(&self) -> Result<ReplProcess> {
        let mut child = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| KernelError::Spawn(format!("{}: {}", self.spec.program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KernelError::Spawn("stdin pipe missing".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KernelError::Spawn("stdout pipe missing".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| KernelError::Spawn("stderr pipe missing".into()))?;

        let (tx, stderr_rx) = mpsc::unbounded_channel();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(ReplProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr_rx,
            stderr_task,
        })
    }

    fn process_mut(&mut self) -> Result<&mut ReplProcess> {
        self.process.as_mut().ok_or(KernelError::NotRunning)
    }

    /// Mark the kernel dead after a fatal stream error.
    fn terminate_on<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            if e.is_fatal() {
                warn!(error = %e, "kernel stream failed, marking terminated");
                self.state = KernelState::Terminated;
            }
        }
        result
    }
}

#[async_trait]
impl Kernel for ReplKernel {
    async fn start(&mut self) -> Result<()> {
        if self.state == KernelState::Running || self.state == KernelState::Interrupting {
            return Ok(());
        }
        debug!(program = %self.spec.program, "starting interpreter");
        let mut process = self.spawn()?;

        // Consume everything up to the initial prompt so reads are clean.
        let banner = process.read_until_prompt(&self.spec.prompt).await;
        self.process = Some(process);
        let banner = self.terminate_on(banner)?;
        trace!(banner_len = banner.len(), "interpreter ready");

        self.state = KernelState::Running;
        Ok(())
    }

    async fn execute(&mut self, code: &str) -> Result<RawOutcome> {
        if self.state != KernelState::Running {
            return Err(KernelError::NotRunning);
        }
        let prompt = self.spec.prompt.clone();
        let process = self.process_mut()?;

        process.stdin.write_all(code.as_bytes()).await?;
        process.stdin.write_all(b"\n").await?;
        process.stdin.flush().await?;
        trace!(code_len = code.len(), "code written to interpreter");

        let stdout = process.read_until_prompt(&prompt).await;
        let stdout = match stdout {
            Ok(s) => s,
            Err(e) => return self.terminate_on(Err(e)),
        };
        let stderr = self.process_mut()?.drain_stderr().await;

        let outcome = RawOutcome::from_streams(stdout, stderr);
        debug!(
            stdout_len = outcome.stdout.len(),
            stderr_len = outcome.stderr.len(),
            status = %outcome.status,
            "execution framed"
        );
        Ok(outcome)
    }

    async fn interrupt(&mut self) -> Result<()> {
        let process = match self.process.as_mut() {
            Some(p) => p,
            None => return Ok(()),
        };
        // Already exited: nothing to signal.
        if let Ok(Some(status)) = process.child.try_wait() {
            debug!(?status, "interrupt skipped, interpreter already exited");
            self.state = KernelState::Terminated;
            return Ok(());
        }
        let pid = match process.child.id() {
            Some(pid) => pid,
            None => return Ok(()),
        };
        debug!(pid, "delivering SIGINT to interpreter");
        kill(Pid::from_raw(pid as i32), Signal::SIGINT)
            .map_err(|e| KernelError::Signal(e.to_string()))?;
        self.state = KernelState::Interrupting;
        Ok(())
    }

    async fn resync(&mut self) -> Result<()> {
        let prompt = self.spec.prompt.clone();
        let process = self.process_mut()?;
        let discarded = process.read_until_prompt(&prompt).await;
        let discarded = self.terminate_on(discarded)?;
        let stderr = self.process_mut()?.drain_stderr().await;
        debug!(
            discarded_len = discarded.len(),
            stderr_len = stderr.len(),
            "kernel back at prompt"
        );
        self.state = KernelState::Running;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut process) = self.process.take() {
            process.stderr_task.abort();
            if let Err(e) = process.child.kill().await {
                warn!(error = %e, "interpreter kill failed (may have already exited)");
            }
        }
        self.state = KernelState::Terminated;
        debug!("kernel shut down");
        Ok(())
    }

    fn state(&self) -> KernelState {
        self.state
    }
}
