use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::envelope::{Envelope, FieldError};
use crate::db::RepoError;
use crate::engine::ComputeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid request")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Internal(msg) => {
                tracing::warn!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Invalid request".to_string(),
                errors,
            ),
            AppError::Compute(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                err.to_string(),
                Vec::new(),
            ),
        };

        let body = Json(Envelope::<()>::error(message, errors));

        (status, body).into_response()
    }
}
