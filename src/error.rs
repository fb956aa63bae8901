use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::CheckoutError;
use crate::domain::value_objects::SlugError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(what: &str, key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} '{key}' does not exist"))
    }

    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<SlugError> for StoreError {
    fn from(err: SlugError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CheckoutError> for StoreError {
    fn from(err: CheckoutError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let (status, kind) = self.kind();
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "storage failure");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({ "error": kind, "message": message });
        (status, Json(body)).into_response()
    }
}
