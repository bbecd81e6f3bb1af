use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Construction-time configuration errors.
///
/// These are never recovered from: they indicate a deployment mistake and
/// must stop startup before any request is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Both the current and the legacy key of one rule family were supplied.
    #[error(
        "{header} option specified twice; remove either `{legacy}` or `{canonical}`"
    )]
    ConflictingOption {
        header: &'static str,
        canonical: &'static str,
        legacy: &'static str,
    },

    #[error("Invalid value for `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Environment error: {0}")]
    Env(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed helmet options: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Per-request failures surfaced through a pipeline's `Eventual`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A terminal handler produced something other than a response or an
    /// eventual response.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A unit or handler panicked while producing or resolving its result.
    #[error("Middleware panicked: {0}")]
    Panicked(String),

    /// Failure reported by a handler or unit through the error channel.
    #[error("Handler failed: {0}")]
    Handler(String),
}

impl PipelineError {
    /// Short machine-readable label used for metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::TypeMismatch { .. } => "type_mismatch",
            PipelineError::Panicked(_) => "panicked",
            PipelineError::Handler(_) => "handler_error",
        }
    }
}

/// Error response body for failed pipelines.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        // Full details stay in the server log; clients get a generic message.
        tracing::error!(error = %self, "Pipeline failed");

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: "An internal error occurred. Please contact support if the issue persists."
                .to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for construction results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for per-request results.
pub type PipelineResult<T> = Result<T, PipelineError>;
