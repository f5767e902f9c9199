use std::sync::Arc;

use futures_util::future::join_all;

use crate::engine::{
    error::EngineError,
    models::{ExecutionMode, Job, JudgeResponse, TestCaseResult, format_elapsed},
    pool::WorkerPool,
    problems::ProblemCatalog,
    verdict::classify,
};

/// Runs a submission against every test case of a problem and folds the
/// per-case verdicts into one response.
#[derive(Clone)]
pub struct Judge {
    pool: WorkerPool,
    catalog: Arc<ProblemCatalog>,
}

impl Judge {
    pub fn new(pool: WorkerPool, catalog: Arc<ProblemCatalog>) -> Self {
        Self { pool, catalog }
    }

    /// Cases are dispatched together and the pool bounds how many actually
    /// run. Results are folded in declared order, whatever order they finish
    /// in.
    pub async fn judge(
        &self,
        problem_id: &str,
        code: &str,
        language: &str,
    ) -> Result<JudgeResponse, EngineError> {
        let problem = self
            .catalog
            .get(problem_id)
            .ok_or_else(|| EngineError::ProblemNotFound(problem_id.to_string()))?;
        if !self.pool.supports(language) {
            return Err(EngineError::UnsupportedLanguage(language.to_string()));
        }
        // Once dispatched, a case that loses its slot is judged RE like any
        // other failed run.
        if self.pool.is_shut_down() {
            return Err(EngineError::PoolUnavailable);
        }

        let runs = problem.test_cases.iter().map(|case| {
            let job = Job::new(language, code, case.input.as_str(), ExecutionMode::Judge);
            self.pool.submit(job)
        });
        let results = join_all(runs).await;

        let mut response = JudgeResponse::new(problem.id.as_str());
        for (case, result) in problem.test_cases.iter().zip(results) {
            let expected = case.expected_output.trim();
            response.push(TestCaseResult {
                name: case.name.clone(),
                input: case.input.clone(),
                expected: expected.to_string(),
                output: result.output.trim().to_string(),
                status: classify(&result, expected),
                execution_time: format_elapsed(result.elapsed),
                error: result.error.map(|e| e.message),
            });
        }

        tracing::info!(
            problem_id = %problem.id,
            language,
            verdict = %response.verdict,
            cases = response.results.len(),
            "submission judged"
        );
        Ok(response)
    }
}
