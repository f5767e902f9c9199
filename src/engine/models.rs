use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Run,
    Judge,
}

/// One execution request, owned by the worker that runs it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub language: String,
    pub code: String,
    pub stdin: String,
    pub mode: ExecutionMode,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        language: impl Into<String>,
        code: impl Into<String>,
        stdin: impl Into<String>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            code: code.into(),
            stdin: stdin.into(),
            mode,
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedLanguage,
    Timeout,
    Runtime,
    PoolUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of exactly one [`Job`].
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: String,
    pub error: Option<ExecutionError>,
    pub success: bool,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn succeeded(output: String, elapsed: Duration) -> Self {
        Self {
            output,
            error: None,
            success: true,
            elapsed,
        }
    }

    pub fn failed(
        kind: ErrorKind,
        message: impl Into<String>,
        output: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            output,
            error: Some(ExecutionError {
                kind,
                message: message.into(),
            }),
            success: false,
            elapsed,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
}

impl Verdict {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Accepted => "AC",
            Self::WrongAnswer => "WA",
            Self::RuntimeError => "RE",
            Self::TimeLimitExceeded => "TLE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub input_format: String,
    pub constraints: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub name: String,
    pub input: String,
    pub expected: String,
    pub output: String,
    pub status: Verdict,
    pub execution_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub problem_id: String,
    pub verdict: Verdict,
    pub results: Vec<TestCaseResult>,
}

impl JudgeResponse {
    pub fn new(problem_id: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            verdict: Verdict::Accepted,
            results: Vec::new(),
        }
    }

    /// Appends in declaration order. The first non-AC case fixes the overall
    /// verdict; later cases never overwrite it.
    pub fn push(&mut self, case: TestCaseResult) {
        if self.verdict == Verdict::Accepted && case.status != Verdict::Accepted {
            self.verdict = case.status;
        }
        self.results.push(case);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub input: String,
}

/// `/api/compile` body: `code` is base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub problem_id: String,
    pub code: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileResponse {
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub status_message: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub execution_time: String,
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{elapsed:?}")
}
