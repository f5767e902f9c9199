use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub sandbox_backend: SandboxBackendKind,
    pub docker: DockerConfig,
    pub execution_timeout: Duration,
    /// Unset means judged submissions get `execution_timeout` too.
    pub judge_timeout: Option<Duration>,
    pub run_max_code_bytes: usize,
    pub problem_max_code_bytes: usize,
    pub max_output_bytes: usize,
    pub workspace_root: PathBuf,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DockerConfig {
    pub binary: String,
    pub image_override: Option<String>,
    pub memory_mb: u64,
    pub pids_limit: u64,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_parse("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080))),
            worker_count: env_parse("WORKER_COUNT", 4usize).max(1),
            queue_capacity: env_parse("QUEUE_CAPACITY", 1024usize).max(1),
            sandbox_backend: env_parse("SANDBOX_BACKEND", SandboxBackendKind::Docker),
            docker: DockerConfig {
                binary: env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string()),
                image_override: env::var("SANDBOX_IMAGE").ok().filter(|s| !s.is_empty()),
                memory_mb: env_parse("SANDBOX_MEMORY_MB", 256),
                pids_limit: env_parse("SANDBOX_PIDS_LIMIT", 64),
            },
            execution_timeout: Duration::from_millis(env_parse("EXECUTION_TIMEOUT_MS", 10_000)),
            judge_timeout: env::var("JUDGE_TIMEOUT_MS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .map(Duration::from_millis),
            run_max_code_bytes: env_parse("RUN_MAX_CODE_BYTES", 10_000usize),
            problem_max_code_bytes: env_parse("PROBLEM_MAX_CODE_BYTES", 1_000_000usize),
            max_output_bytes: env_parse("MAX_OUTPUT_BYTES", 64 * 1024usize),
            workspace_root: env::var("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SandboxBackendKind {
    #[default]
    Docker,
    Process,
}

impl FromStr for SandboxBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "process" => Ok(Self::Process),
            _ => Err(format!("unsupported sandbox backend: {s}")),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_kind_case_insensitively() {
        assert_eq!("Process".parse(), Ok(SandboxBackendKind::Process));
        assert_eq!("DOCKER".parse(), Ok(SandboxBackendKind::Docker));
        assert!("firecracker".parse::<SandboxBackendKind>().is_err());
    }

    #[test]
    fn unparsable_values_fall_back_to_default() {
        assert_eq!(env_parse("JUDGE_ENGINE_TEST_UNSET_KEY", 7usize), 7);
    }
}
