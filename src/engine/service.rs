use std::{sync::Arc, time::Instant};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::engine::{
    error::EngineError,
    judge::Judge,
    models::{
        CompileResponse, ExecutionMode, ExecutionResult, Job, JudgeResponse, Problem,
        format_elapsed,
    },
    normalize::normalize_language,
    pool::WorkerPool,
    problems::ProblemCatalog,
    sanitize::sanitize,
};

/// The call shapes behind the HTTP front door.
#[derive(Clone)]
pub struct CompilerService {
    pool: WorkerPool,
    judge: Judge,
    catalog: Arc<ProblemCatalog>,
    run_max_code_bytes: usize,
    problem_max_code_bytes: usize,
}

impl CompilerService {
    pub fn new(
        pool: WorkerPool,
        catalog: Arc<ProblemCatalog>,
        run_max_code_bytes: usize,
        problem_max_code_bytes: usize,
    ) -> Self {
        Self {
            judge: Judge::new(pool.clone(), catalog.clone()),
            pool,
            catalog,
            run_max_code_bytes,
            problem_max_code_bytes,
        }
    }

    /// `code_base64` is standard-alphabet base64.
    pub async fn compile(
        &self,
        code_base64: &str,
        language: &str,
        stdin: &str,
    ) -> CompileResponse {
        let code = match STANDARD
            .decode(code_base64)
            .map_err(|e| e.to_string())
            .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()))
        {
            Ok(code) => code,
            Err(err) => {
                return CompileResponse {
                    error: err,
                    status_message: "Failed to decode base64".to_string(),
                    ..Default::default()
                };
            }
        };
        self.run(&code, language, stdin, self.run_max_code_bytes).await
    }

    pub async fn execute(&self, code: &str, language: &str, stdin: &str) -> CompileResponse {
        self.run(code, language, stdin, self.run_max_code_bytes).await
    }

    pub async fn execute_problem_code(&self, code: &str, language: &str) -> CompileResponse {
        self.run(code, language, "", self.problem_max_code_bytes).await
    }

    pub async fn judge(
        &self,
        problem_id: &str,
        code: &str,
        language: &str,
    ) -> Result<JudgeResponse, EngineError> {
        if self.catalog.get(problem_id).is_none() {
            return Err(EngineError::ProblemNotFound(problem_id.to_string()));
        }
        let language = normalize_language(language);
        if !self.pool.supports(&language) {
            return Err(EngineError::UnsupportedLanguage(language));
        }
        sanitize(code, &language, self.problem_max_code_bytes).map_err(|err| {
            tracing::warn!(problem_id, language = %language, reason = %err, "submission rejected");
            EngineError::SanitizationRejected(err.to_string())
        })?;

        self.judge.judge(problem_id, code, &language).await
    }

    pub fn problems(&self) -> &[Problem] {
        self.catalog.list()
    }

    async fn run(
        &self,
        code: &str,
        language: &str,
        stdin: &str,
        max_len: usize,
    ) -> CompileResponse {
        let started = Instant::now();
        let language = normalize_language(language);
        if let Err(err) = sanitize(code, &language, max_len) {
            tracing::warn!(language = %language, reason = %err, "code rejected");
            return CompileResponse {
                error: err.to_string(),
                status_message: err.to_string(),
                ..Default::default()
            };
        }

        let result = self
            .pool
            .submit(Job::new(language, code, stdin, ExecutionMode::Run))
            .await;
        respond(result, started)
    }
}

fn respond(result: ExecutionResult, started: Instant) -> CompileResponse {
    match result.error {
        Some(error) => CompileResponse {
            output: result.output,
            error: error.message,
            status_message: "Failed to execute code".to_string(),
            ..Default::default()
        },
        None if !result.success => CompileResponse {
            output: result.output,
            status_message: "Failed to execute code".to_string(),
            ..Default::default()
        },
        None => CompileResponse {
            output: result.output,
            status_message: "Success".to_string(),
            success: true,
            execution_time: format_elapsed(started.elapsed()),
            ..Default::default()
        },
    }
}
