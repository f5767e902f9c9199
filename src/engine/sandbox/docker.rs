use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{process::Command, time::Instant};

use crate::engine::{
    config::DockerConfig,
    sandbox::{
        BUILD_FAILED_STATUS, Phase, RunSpec, SandboxBackend, SandboxOutcome,
        process::{StepOutput, run_to_deadline},
    },
};

const CONTAINER_WORKDIR: &str = "/app/temp";
const REMOVE_TIMEOUT: Duration = Duration::from_secs(10);

/// One throwaway container per job: no network, workspace bind-mounted, the
/// recipe's shell script as the entrypoint.
pub struct DockerSandbox {
    config: DockerConfig,
}

impl DockerSandbox {
    pub fn new(config: DockerConfig) -> anyhow::Result<Self> {
        if config.memory_mb == 0 || config.pids_limit == 0 {
            anyhow::bail!("docker sandbox limits must be greater than zero");
        }
        Ok(Self { config })
    }

    fn run_command(&self, spec: &RunSpec, container: &str) -> Command {
        let image = self
            .config
            .image_override
            .as_deref()
            .unwrap_or(spec.recipe.image);
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("run")
            .arg("--rm")
            .args(["--name", container])
            .args(["--network", "none"])
            .arg(format!("--memory={}m", self.config.memory_mb))
            .arg(format!("--pids-limit={}", self.config.pids_limit))
            .arg("-v")
            .arg(format!("{}:{CONTAINER_WORKDIR}", spec.workspace.display()))
            .args(["-w", CONTAINER_WORKDIR])
            .arg(image)
            .args(["sh", "-c"])
            .arg(spec.recipe.shell_script())
            .stdin(Stdio::null());
        cmd
    }

    /// Killing the CLI client does not stop the container, so remove it by name.
    async fn force_remove(&self, container: &str) {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(["rm", "-f", container])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        match tokio::time::timeout(REMOVE_TIMEOUT, cmd.status()).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => {
                tracing::warn!(container, %status, "docker rm exited unsuccessfully")
            }
            Ok(Err(err)) => tracing::warn!(container, error = %err, "docker rm failed"),
            Err(_) => tracing::warn!(container, "docker rm timed out"),
        }
    }
}

#[async_trait]
impl SandboxBackend for DockerSandbox {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn execute(&self, spec: RunSpec) -> anyhow::Result<SandboxOutcome> {
        let container = format!("judge-{}", spec.job_id.as_simple());
        let started = Instant::now();
        let cmd = self.run_command(&spec, &container);

        let out = match run_to_deadline(cmd, spec.deadline, spec.max_output_bytes).await {
            Ok(out) => out,
            Err(err) => {
                self.force_remove(&container).await;
                return Err(err);
            }
        };
        if out.timed_out {
            self.force_remove(&container).await;
        }

        let StepOutput {
            stdout,
            stderr,
            exit_code,
            timed_out,
        } = out;
        // Only recipes with build steps can exit with the reserved status.
        let phase = if exit_code == BUILD_FAILED_STATUS && !spec.recipe.build.is_empty() {
            Phase::Build
        } else {
            Phase::Run
        };
        Ok(SandboxOutcome {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
            duration: started.elapsed(),
            timed_out,
            phase,
        })
    }
}
