//! Container runtime abstraction and the Docker backend.

use crate::error::{ExecutorError, Result};
use crate::output::STDERR_MARKER;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, warn};

/// The denominator for the CPU quota: 100_000us scheduler period.
const CPU_PERIOD: i64 = 100_000;

/// Everything needed to provision one isolated instance.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub memory_bytes: i64,
    pub cpu_quota: i64,
}

/// Lifecycle operations the executor needs from a container backend.
///
/// Docker is the production backend; tests substitute an in-memory
/// implementation to exercise the teardown guarantees without a daemon.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create and start an instance, returning its runtime id.
    ///
    /// Must not leak a created-but-unstarted container: if the start step
    /// fails the implementation removes the container before returning.
    async fn create(&self, spec: &ContainerSpec) -> Result<String>;

    /// Block until the instance exits and return its exit code.
    async fn wait(&self, id: &str) -> Result<i64>;

    /// The instance's complete log, with every stderr line carrying
    /// [`STDERR_MARKER`] so the collector can split the streams.
    async fn logs(&self, id: &str) -> Result<String>;

    /// Kill the instance if it is still running.
    async fn kill(&self, id: &str) -> Result<()>;

    /// Force-remove the instance and its filesystem.
    async fn remove(&self, id: &str) -> Result<()>;
}

/// [`ContainerRuntime`] backed by the local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect via the platform's local defaults (unix socket or pipe).
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            env: Some(spec.env.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            network_disabled: Some(true),
            host_config: Some(HostConfig {
                memory: Some(spec.memory_bytes),
                cpu_period: Some(CPU_PERIOD),
                cpu_quota: Some(spec.cpu_quota),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self.docker.create_container(Some(options), config).await?;
        debug!(container_id = %created.id, image = %spec.image, "container created");

        if let Err(e) = self
            .docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await
        {
            warn!(container_id = %created.id, error = %e, "start failed, removing container");
            let _ = self
                .docker
                .remove_container(
                    &created.id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await;
            return Err(e.into());
        }

        Ok(created.id)
    }

    async fn wait(&self, id: &str) -> Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.docker.wait_container(id, Some(options));
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // Non-zero exits surface as a wait error carrying the code.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => Err(ExecutorError::Provisioning(format!(
                "wait stream for {id} ended without a status"
            ))),
        }
    }

    async fn logs(&self, id: &str) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        let mut stdout = String::new();
        let mut stderr = String::new();
        while let Some(output) = stream.next().await {
            match output? {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    stdout.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdErr { message } => {
                    stderr.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdIn { .. } => {}
            }
        }
        Ok(interleave_streams(&stdout, &stderr))
    }

    async fn kill(&self, id: &str) -> Result<()> {
        self.docker
            .kill_container(id, None::<KillContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }
}

/// Join demuxed streams into one log, marking every stderr line so the
/// collector can route it back.
fn interleave_streams(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        return stdout.to_string();
    }
    let mut combined = stdout.to_string();
    if !combined.is_empty() && !combined.ends_with('\n') {
        combined.push('\n');
    }
    for line in stderr.lines() {
        combined.push_str(STDERR_MARKER);
        combined.push_str(line);
        combined.push('\n');
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputCollector;

    #[test]
    fn test_interleave_marks_every_stderr_line() {
        let combined = interleave_streams("out1\nout2\n", "err1\nerr2\n");
        assert_eq!(combined, "out1\nout2\n[STDERR] err1\n[STDERR] err2\n");
    }

    #[test]
    fn test_interleave_without_stderr_is_stdout() {
        assert_eq!(interleave_streams("hello\n", ""), "hello\n");
    }

    #[test]
    fn test_interleave_inserts_newline_after_partial_stdout() {
        let combined = interleave_streams("no trailing newline", "oops");
        assert_eq!(combined, "no trailing newline\n[STDERR] oops\n");
    }

    #[test]
    fn test_interleave_round_trips_through_collector() {
        let combined = interleave_streams("result: 15\n", "warning: unused\n");
        let (stdout, stderr) = OutputCollector::default().split(&combined);
        assert_eq!(stdout, "result: 15");
        assert_eq!(stderr, "warning: unused");
    }
}
