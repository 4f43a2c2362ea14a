// src/server/error.rs

//! HTTP rendering of [`RunboxError`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::errors::RunboxError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl RunboxError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RunboxError::InvalidInput(_) | RunboxError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            }
            RunboxError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RunboxError::Forbidden(_) => StatusCode::FORBIDDEN,
            RunboxError::NotFound(_) => StatusCode::NOT_FOUND,
            RunboxError::DuplicateId(_) => StatusCode::CONFLICT,
            RunboxError::SpawnFailure { .. }
            | RunboxError::ConfigError(_)
            | RunboxError::IoError(_)
            | RunboxError::TomlError(_)
            | RunboxError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Internal details stay in the log.
    fn public_message(&self) -> String {
        match self {
            RunboxError::InvalidInput(msg)
            | RunboxError::NotFound(msg)
            | RunboxError::Forbidden(msg)
            | RunboxError::Unauthorized(msg) => msg.clone(),
            RunboxError::UnsupportedLanguage(lang) => format!("Unsupported language: {lang}"),
            RunboxError::DuplicateId(_) => "Execution id already in use".to_string(),
            RunboxError::SpawnFailure { program, .. } => format!("Failed to start '{program}'"),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for RunboxError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        let body = ErrorBody {
            error: self.public_message(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
