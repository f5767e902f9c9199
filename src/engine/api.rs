use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::engine::{
    error::EngineError,
    metrics::MetricsRegistry,
    models::{
        CompileRequest, CompileResponse, ExecuteRequest, JudgeResponse, Problem,
        SubmissionRequest,
    },
    service::CompilerService,
};

#[derive(Clone)]
pub struct AppState {
    service: CompilerService,
    metrics: Arc<MetricsRegistry>,
}

pub fn routes(service: CompilerService, metrics_registry: Arc<MetricsRegistry>) -> Router {
    let state = AppState {
        service,
        metrics: metrics_registry,
    };
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route("/api/execute", post(execute))
        .route("/api/compile", post(compile))
        .route("/api/problems", get(list_problems))
        .route("/api/problems/submit", post(submit_solution))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    (StatusCode::OK, state.metrics.render_prometheus())
}

async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<CompileResponse>, EngineError> {
    let code = request.code.trim();
    let language = request.language.trim();
    if code.is_empty() || language.is_empty() {
        return Err(EngineError::InvalidRequest(
            "code and language are required".to_string(),
        ));
    }

    let response = if request.mode.eq_ignore_ascii_case("problem") {
        state.service.execute_problem_code(code, language).await
    } else {
        state.service.execute(code, language, &request.input).await
    };
    Ok(Json(response))
}

async fn compile(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> Result<Json<CompileResponse>, EngineError> {
    if request.language.trim().is_empty() {
        return Err(EngineError::InvalidRequest("language is required".to_string()));
    }
    let response = state
        .service
        .compile(request.code.trim(), request.language.trim(), &request.input)
        .await;
    Ok(Json(response))
}

async fn list_problems(State(state): State<AppState>) -> Json<Vec<Problem>> {
    Json(state.service.problems().to_vec())
}

async fn submit_solution(
    State(state): State<AppState>,
    Json(request): Json<SubmissionRequest>,
) -> Result<Json<JudgeResponse>, EngineError> {
    if request.problem_id.trim().is_empty() {
        return Err(EngineError::InvalidRequest("problem_id is required".to_string()));
    }
    let response = state
        .service
        .judge(request.problem_id.trim(), &request.code, request.language.trim())
        .await?;
    Ok(Json(response))
}
