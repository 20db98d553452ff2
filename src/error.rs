use crate::compile::CompileError;
use crate::domain::ArithmeticError;
use crate::engine::EvaluationError;
use crate::orchestration::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<ArithmeticError> for AppError {
    fn from(err: ArithmeticError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}

impl From<CompileError> for AppError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::NotReady(_) | CompileError::Arithmetic(_) => {
                AppError::Unprocessable(err.to_string())
            }
            CompileError::MissingContext | CompileError::HintLookup(_) => {
                AppError::Unavailable(err.to_string())
            }
            CompileError::MissingToken(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownStrategy(_) | SessionError::PositionNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            SessionError::TooManyInputs { .. } => AppError::BadRequest(err.to_string()),
            SessionError::Evaluation(EvaluationError::Arithmetic(e))
            | SessionError::Arithmetic(e) => e.into(),
            SessionError::Evaluation(e) => AppError::BadRequest(e.to_string()),
            SessionError::Compile(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
