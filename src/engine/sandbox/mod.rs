mod docker;
mod language;
mod process;
mod recipe;

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::engine::config::{EngineConfig, SandboxBackendKind};

pub use docker::DockerSandbox;
pub use language::{Language, Toolchain};
pub use process::ProcessSandbox;
pub use recipe::{BUILD_FAILED_STATUS, INPUT_ARTIFACT, Recipe, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Run,
}

#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub timed_out: bool,
    pub phase: Phase,
}

/// Everything a backend needs for one job. Artifacts are already written into
/// `workspace` when the backend sees it.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub job_id: Uuid,
    pub recipe: Recipe,
    pub workspace: PathBuf,
    pub deadline: Instant,
    pub max_output_bytes: usize,
}

#[async_trait]
pub trait SandboxBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, spec: RunSpec) -> anyhow::Result<SandboxOutcome>;
}

pub struct SandboxFactory;

impl SandboxFactory {
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Arc<dyn SandboxBackend>> {
        match config.sandbox_backend {
            SandboxBackendKind::Docker => Ok(Arc::new(DockerSandbox::new(config.docker.clone())?)),
            SandboxBackendKind::Process => Ok(Arc::new(ProcessSandbox::new())),
        }
    }
}
