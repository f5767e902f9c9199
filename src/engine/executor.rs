use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tempfile::TempDir;
use tokio::time::Instant;

use crate::engine::{
    models::{ErrorKind, ExecutionResult, Job},
    profiles::ProfileTable,
    sandbox::{Phase, Recipe, RunSpec, SandboxBackend, SandboxOutcome},
};

/// Runs one job end to end: profile lookup, workspace, sandbox under the
/// job's deadline, classification, workspace removal.
pub struct Executor {
    profiles: Arc<ProfileTable>,
    backend: Arc<dyn SandboxBackend>,
    workspace_root: PathBuf,
    max_output_bytes: usize,
}

impl Executor {
    pub fn new(
        profiles: Arc<ProfileTable>,
        backend: Arc<dyn SandboxBackend>,
        workspace_root: PathBuf,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            profiles,
            backend,
            workspace_root,
            max_output_bytes,
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub async fn run(&self, job: &Job) -> ExecutionResult {
        let Some(profile) = self.profiles.lookup(&job.language) else {
            return ExecutionResult::failed(
                ErrorKind::UnsupportedLanguage,
                format!("unsupported language: {}", job.language),
                String::new(),
                Duration::ZERO,
            );
        };

        let timeout = profile.timeout_for(job.mode);
        let started = Instant::now();
        let deadline = started + timeout;
        let recipe = profile.toolchain.recipe(&job.code, &job.stdin);

        let workspace = match self.prepare_workspace(&recipe).await {
            Ok(workspace) => workspace,
            Err(err) => {
                tracing::error!(
                    job_id = %job.id,
                    error = %format!("{err:#}"),
                    "workspace setup failed"
                );
                return ExecutionResult::failed(
                    ErrorKind::Runtime,
                    format!("failed to prepare workspace: {err:#}"),
                    String::new(),
                    started.elapsed(),
                );
            }
        };

        let spec = RunSpec {
            job_id: job.id,
            recipe,
            workspace: workspace.path().to_path_buf(),
            deadline,
            max_output_bytes: self.max_output_bytes,
        };
        let outcome = self.backend.execute(spec).await;

        let workspace_path = workspace.path().to_path_buf();
        if let Err(err) = workspace.close() {
            tracing::warn!(
                job_id = %job.id,
                path = %workspace_path.display(),
                error = %err,
                "workspace cleanup failed"
            );
        }

        match outcome {
            Ok(outcome) => self.classify(job, outcome, timeout),
            Err(err) => {
                tracing::error!(
                    job_id = %job.id,
                    backend = self.backend.name(),
                    error = %format!("{err:#}"),
                    "sandbox launch failed"
                );
                ExecutionResult::failed(
                    ErrorKind::Runtime,
                    format!("sandbox failure: {err:#}"),
                    String::new(),
                    started.elapsed(),
                )
            }
        }
    }

    async fn prepare_workspace(&self, recipe: &Recipe) -> anyhow::Result<TempDir> {
        tokio::fs::create_dir_all(&self.workspace_root)
            .await
            .with_context(|| format!("cannot create {}", self.workspace_root.display()))?;
        let workspace = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(&self.workspace_root)
            .context("cannot create job workspace")?;
        for artifact in &recipe.artifacts {
            tokio::fs::write(workspace.path().join(artifact.name), &artifact.contents)
                .await
                .with_context(|| format!("cannot write {}", artifact.name))?;
        }
        Ok(workspace)
    }

    fn classify(&self, job: &Job, outcome: SandboxOutcome, timeout: Duration) -> ExecutionResult {
        let elapsed_ms = outcome.duration.as_millis() as u64;
        if outcome.timed_out {
            tracing::warn!(
                job_id = %job.id,
                language = %job.language,
                elapsed_ms,
                "time limit exceeded"
            );
            return ExecutionResult::failed(
                ErrorKind::Timeout,
                format!("time limit exceeded ({}ms)", timeout.as_millis()),
                outcome.stdout,
                outcome.duration,
            );
        }

        if outcome.exit_code != 0 {
            let message = match outcome.phase {
                Phase::Build => format!("compilation failed: exit status {}", outcome.exit_code),
                Phase::Run => format!("exit status {}", outcome.exit_code),
            };
            let mut output = outcome.stdout;
            output.push_str(&outcome.stderr);
            return ExecutionResult::failed(ErrorKind::Runtime, message, output, outcome.duration);
        }

        ExecutionResult::succeeded(outcome.stdout, outcome.duration)
    }
}
