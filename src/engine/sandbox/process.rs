use std::{
    os::unix::process::ExitStatusExt,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use anyhow::Context;
use async_trait::async_trait;
use tokio::{io::AsyncReadExt, process::Command, task::JoinHandle, time::Instant};

use crate::engine::sandbox::{
    INPUT_ARTIFACT, Phase, RunSpec, SandboxBackend, SandboxOutcome, Step,
};

const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";
const READER_GRACE: Duration = Duration::from_secs(1);

/// Runs recipe steps as host processes. Provides deadline and process-tree
/// cleanup only; isolation is whatever the host already gives.
///
/// Cleanup is a `killpg` of each step's process group. A descendant that
/// moves to its own session or group (`setsid`, `setpgid`) is not reached and
/// can outlive the job, so this backend is for trusted code and tests; use
/// [`DockerSandbox`](super::DockerSandbox) for untrusted submissions.
pub struct ProcessSandbox;

impl ProcessSandbox {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SandboxBackend for ProcessSandbox {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn execute(&self, spec: RunSpec) -> anyhow::Result<SandboxOutcome> {
        let started = Instant::now();
        let limit = spec.max_output_bytes;

        for step in &spec.recipe.build {
            let mut cmd = step_command(step, &spec.workspace);
            cmd.stdin(Stdio::null());
            let out = run_to_deadline(cmd, spec.deadline, limit).await?;
            if out.timed_out || out.exit_code != 0 {
                tracing::debug!(
                    job_id = %spec.job_id,
                    program = %step.program,
                    "build step failed"
                );
                return Ok(out.into_outcome(Phase::Build, started.elapsed()));
            }
        }

        let input = tokio::fs::File::open(spec.workspace.join(INPUT_ARTIFACT))
            .await
            .context("failed to open input artifact")?
            .into_std()
            .await;
        let mut cmd = step_command(&spec.recipe.run, &spec.workspace);
        cmd.stdin(Stdio::from(input));
        let out = run_to_deadline(cmd, spec.deadline, limit).await?;
        Ok(out.into_outcome(Phase::Run, started.elapsed()))
    }
}

fn step_command(step: &Step, work_dir: &Path) -> Command {
    let program = match step.program.strip_prefix("./") {
        Some(local) => work_dir.join(local).into_os_string(),
        None => step.program.clone().into(),
    };
    let mut cmd = Command::new(program);
    cmd.args(&step.args)
        .current_dir(work_dir)
        .env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string()))
        .env("HOME", work_dir)
        .env("LANG", "C.UTF-8");
    cmd
}

pub(crate) struct StepOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl StepOutput {
    fn into_outcome(self, phase: Phase, duration: Duration) -> SandboxOutcome {
        SandboxOutcome {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_code: self.exit_code,
            duration,
            timed_out: self.timed_out,
            phase,
        }
    }
}

/// Spawns `cmd` as the leader of a new process group and waits for it until
/// `deadline`. The whole group is SIGKILLed afterwards on every path, so
/// nothing the command forked survives it.
pub(crate) async fn run_to_deadline(
    mut cmd: Command,
    deadline: Instant,
    limit: usize,
) -> anyhow::Result<StepOutput> {
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let mut child = cmd.spawn().context("failed to spawn sandbox command")?;
    let pid = child.id();

    let stdout = child.stdout.take().context("missing stdout pipe")?;
    let stderr = child.stderr.take().context("missing stderr pipe")?;
    let stdout_task = tokio::spawn(async move { read_limited(stdout, limit).await });
    let stderr_task = tokio::spawn(async move { read_limited(stderr, limit).await });

    let wait_result = tokio::time::timeout_at(deadline, child.wait()).await;
    kill_process_group(pid);

    let (exit_code, timed_out) = match wait_result {
        Ok(Ok(status)) => (status_code(status), false),
        Ok(Err(err)) => {
            stdout_task.abort();
            stderr_task.abort();
            return Err(err).context("sandbox command wait failed");
        }
        Err(_) => {
            let _ = child.wait().await;
            (-1, true)
        }
    };

    Ok(StepOutput {
        stdout: collect(stdout_task).await,
        stderr: collect(stderr_task).await,
        exit_code,
        timed_out,
    })
}

pub(crate) fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    let pgid = nix::unistd::Pid::from_raw(pid);
    let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL);
}

fn status_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

async fn collect(task: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = task.abort_handle();
    match tokio::time::timeout(READER_GRACE, task).await {
        Ok(bytes) => bytes.unwrap_or_default(),
        Err(_) => {
            // a descendant escaped the process group and still holds the pipe
            tracing::warn!("output pipe still open after kill, dropping stream");
            abort.abort();
            Vec::new()
        }
    }
}

async fn read_limited<R>(mut reader: R, limit: usize) -> Vec<u8>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut out = Vec::with_capacity(limit.min(8192));
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if out.len() < limit {
                    let remaining = limit - out.len();
                    out.extend_from_slice(&chunk[..remaining.min(n)]);
                }
            }
            Err(_) => break,
        }
    }
    out
}
