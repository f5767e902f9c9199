//! Sandbox fakes shared by the pool, judge, and service tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::engine::{
    profiles::LanguageProfile,
    sandbox::{
        INPUT_ARTIFACT, Phase, Recipe, RunSpec, SandboxBackend, SandboxOutcome, Step, Toolchain,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    LaunchError,
    Panic,
}

#[derive(Debug, Clone)]
pub struct Scripted {
    pub stdout: String,
    pub exit_code: i32,
    pub timed_out: bool,
    pub delay: Duration,
    pub fault: Option<Fault>,
}

impl Scripted {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: 0,
            timed_out: false,
            delay: Duration::ZERO,
            fault: None,
        }
    }

    pub fn fault(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::ok("")
        }
    }

    pub fn crash(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::ok("")
        }
    }

    pub fn hang() -> Self {
        Self {
            timed_out: true,
            exit_code: -1,
            ..Self::ok("")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Script = dyn Fn(&str) -> Scripted + Send + Sync;

/// Answers each run from its stdin artifact and records how many runs
/// overlapped.
pub struct ScriptedBackend {
    script: Box<Script>,
    running: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: impl Fn(&str) -> Scripted + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn echo() -> Self {
        Self::new(|stdin: &str| Scripted::ok(stdin))
    }
}

#[async_trait]
impl SandboxBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(&self, spec: RunSpec) -> anyhow::Result<SandboxOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        let stdin = spec
            .recipe
            .artifacts
            .iter()
            .find(|a| a.name == INPUT_ARTIFACT)
            .map(|a| a.contents.clone())
            .unwrap_or_default();
        let scripted = (self.script)(&stdin);
        tokio::time::sleep(scripted.delay).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        match scripted.fault {
            Some(Fault::LaunchError) => anyhow::bail!("scripted launch failure"),
            Some(Fault::Panic) => panic!("scripted backend panic"),
            None => {}
        }
        Ok(SandboxOutcome {
            stdout: scripted.stdout,
            stderr: String::new(),
            exit_code: scripted.exit_code,
            duration: scripted.delay,
            timed_out: scripted.timed_out,
            phase: Phase::Run,
        })
    }
}

/// Treats the submitted code as a POSIX shell script.
struct ShToolchain;

impl Toolchain for ShToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "alpine:3",
            "script.sh",
            code,
            stdin,
            Vec::new(),
            Step::new("sh", ["script.sh"]),
        )
    }
}

pub fn sh_profile(timeout: Duration) -> LanguageProfile {
    LanguageProfile {
        id: "sh",
        timeout,
        judge_timeout: timeout,
        toolchain: Arc::new(ShToolchain),
    }
}
