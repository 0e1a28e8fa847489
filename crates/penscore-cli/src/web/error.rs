//! Plain-text error responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::task::JoinError;
use tracing::error;

use penscore_core::error::{AnalysisError, AuthError, ReportError, StoreError};

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Log the cause and answer with a generic 500.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!("Request failed: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken | AuthError::InvalidCredentials => {
                Self::new(StatusCode::OK, err.to_string())
            }
            AuthError::MissingField(field) => Self::bad_request(format!("Missing field: {field}")),
            other => Self::internal(other),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::UnsupportedLanguage(lang) => {
                Self::bad_request(format!("Unsupported language: {lang}"))
            }
            AnalysisError::Decode(e) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Could not read the uploaded image: {e}"),
            ),
            other => Self::internal(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        Self::internal(err)
    }
}

impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        Self::internal(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
