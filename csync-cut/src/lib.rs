//! csync-cut library interface
//!
//! Competition cut pipeline, collaborator adapters, song record store,
//! background jobs and the HTTP API of the csync-cut service.

pub mod api;
pub mod audio;
pub mod collaborators;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult, CutError, CutResult};

use axum::Router;
use chrono::{DateTime, Utc};
use csync_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::workflow::{ActiveJobs, JobContext};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Job notifications, streamed to SSE clients
    pub event_bus: EventBus,
    pub jobs: JobContext,
    /// Jobs running in this process, one per song and kind
    pub active_jobs: ActiveJobs,
    pub startup_time: DateTime<Utc>,
    /// Last job failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(jobs: JobContext, event_bus: EventBus) -> Self {
        Self {
            db: jobs.db.clone(),
            event_bus,
            jobs,
            active_jobs: ActiveJobs::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::song_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
