use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("an application with email {0} already exists")]
    DuplicateEmail(String),

    #[error("candidate {0} not found")]
    NotFound(String),

    #[error("the 3-day editing window for candidate {0} has expired")]
    EditWindowExpired(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("storage failure: {0}")]
    Persistence(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EditWindowExpired(_) => "EDIT_WINDOW_EXPIRED",
            AppError::Validation(_) => "VALIDATION",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EditWindowExpired(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Persistence(format!("{value:#}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Persistence(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
