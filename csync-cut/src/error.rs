//! Error types for csync-cut
//!
//! [`CutError`] is the pipeline/job taxonomy; [`ApiError`] is what HTTP
//! handlers return and maps onto status codes plus a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// External system a [`CutError::Collaborator`] failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Analysis,
    RecordStore,
    ObjectStore,
    Normalizer,
    Encoder,
    Notifier,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Collaborator::Analysis => "analysis",
            Collaborator::RecordStore => "record store",
            Collaborator::ObjectStore => "object store",
            Collaborator::Normalizer => "normalizer",
            Collaborator::Encoder => "encoder",
            Collaborator::Notifier => "notifier",
        };
        f.write_str(name)
    }
}

/// Cut pipeline and job errors
#[derive(Debug, Error)]
pub enum CutError {
    /// Cut requested for a song with no target duration
    #[error("Song {0} has no target duration")]
    MissingTargetDuration(Uuid),

    /// Every section was excluded (e.g. all tagged SKIP)
    #[error("No sections selected for the cut")]
    NoSectionsSelected,

    /// Assembler received no audio spans
    #[error("Cannot assemble an empty selection")]
    EmptySelection,

    /// An external collaborator failed
    #[error("{collaborator} failed: {source:#}")]
    Collaborator {
        collaborator: Collaborator,
        #[source]
        source: anyhow::Error,
    },

    /// Audio did not have the expected layout
    #[error("Unexpected audio format: {0}")]
    UnexpectedAudioFormat(String),

    #[error("Song not found: {0}")]
    SongNotFound(Uuid),

    /// Cut requested before the analysis job produced a result
    #[error("Song {0} has not been analyzed")]
    MissingAnalysis(Uuid),

    /// A blocking job step panicked or was cancelled
    #[error("Job task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CutError {
    /// Wrap an adapter failure with the collaborator identity
    pub fn collaborator(collaborator: Collaborator, source: impl Into<anyhow::Error>) -> Self {
        CutError::Collaborator {
            collaborator,
            source: source.into(),
        }
    }
}

impl From<sqlx::Error> for CutError {
    fn from(err: sqlx::Error) -> Self {
        CutError::collaborator(Collaborator::RecordStore, err)
    }
}

impl From<csync_common::Error> for CutError {
    fn from(err: csync_common::Error) -> Self {
        CutError::collaborator(Collaborator::RecordStore, err)
    }
}

/// Result type for pipeline and job code
pub type CutResult<T> = Result<T, CutError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), job already running for this song
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Pipeline or record store error
    #[error(transparent)]
    Cut(#[from] CutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Cut(ref err) => match err {
                CutError::SongNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
                CutError::MissingTargetDuration(_) | CutError::MissingAnalysis(_) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
                }
                CutError::Collaborator { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COLLABORATOR_ERROR",
                    err.to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    err.to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
