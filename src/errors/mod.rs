//! Error handling module for the tour backend.
//!
//! Provides the store and transition error taxonomy plus the HTTP-facing
//! `AppError` with its mapping to status codes and response envelopes.

use std::fmt;
use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const STEP_FAILED: &str = "STEP_FAILED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
}

/// Failure of a read or write against one of the backing stores.
#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Backend(String),
}

/// Named steps of the close/open flows, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourStep {
    Participants,
    Events,
    EventDays,
    MapSnapshot,
    StatusWrite,
    EventDelete,
}

impl TourStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStep::Participants => "participants",
            TourStep::Events => "events",
            TourStep::EventDays => "event-days",
            TourStep::MapSnapshot => "map-snapshot",
            TourStep::StatusWrite => "status-write",
            TourStep::EventDelete => "event-delete",
        }
    }
}

impl fmt::Display for TourStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a structured tour transition.
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    /// A mandatory step failed; the remaining steps were not run.
    #[error("step `{step}` failed: {source}")]
    Step {
        step: TourStep,
        #[source]
        source: DataAccessError,
    },
    /// Another close/open is already running in this process.
    #[error("a tour transition is already in progress")]
    Busy,
}

impl TourError {
    pub fn step(step: TourStep, source: DataAccessError) -> Self {
        TourError::Step { step, source }
    }

    /// The failing step, if this error came from one.
    pub fn failed_step(&self) -> Option<TourStep> {
        match self {
            TourError::Step { step, .. } => Some(*step),
            TourError::Busy => None,
        }
    }
}

/// Non-fatal failure to delete a managed asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetCleanupError {
    #[error("blob store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("blob store rejected delete with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("blob delete timed out after {0:?}")]
    Timeout(Duration),
    #[error("blob store not configured")]
    NotConfigured,
}

/// Application error type returned at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Authentication required
    #[error("{0}")]
    Unauthorized(String),
    /// Malformed request values
    #[error("{0}")]
    Validation(String),
    /// Concurrent transition in progress
    #[error("{0}")]
    Conflict(String),
    /// A transition step failed; retry the whole flow
    #[error("{message}")]
    StepFailed { step: TourStep, message: String },
    /// Database error outside of a transition
    #[error("{0}")]
    Database(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StepFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::StepFailed { .. } => codes::STEP_FAILED,
            AppError::Database(_) => codes::DATABASE_ERROR,
        }
    }
}

impl From<DataAccessError> for AppError {
    fn from(err: DataAccessError) -> Self {
        tracing::error!("Data access error: {:?}", err);
        AppError::Database(err.to_string())
    }
}

impl From<TourError> for AppError {
    fn from(err: TourError) -> Self {
        match err {
            TourError::Step { step, ref source } => AppError::StepFailed {
                step,
                message: format!("Tour transition failed at step `{}`: {}", step, source),
            },
            TourError::Busy => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::StepFailed { step, .. } => Some(serde_json::json!({ "step": step })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
