use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("{0}")]
    SanitizationRejected(String),
    #[error("problem not found: {0}")]
    ProblemNotFound(String),
    #[error("execution pool unavailable")]
    PoolUnavailable,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl EngineError {
    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            EngineError::SanitizationRejected(_) => StatusCode::BAD_REQUEST,
            EngineError::ProblemNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::PoolUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}
