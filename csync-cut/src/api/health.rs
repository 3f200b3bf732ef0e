//! GET /health: process liveness, record store reachability and the jobs
//! this process is running.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use csync_common::models::JobKind;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the record store does not answer
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub record_store: &'static str,
    pub running: RunningJobs,
    /// Most recent job failure in this process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunningJobs {
    pub analysis: usize,
    pub cut: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    let record_store = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!("Health check: record store unavailable: {}", e);
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: if record_store == "ok" { "ok" } else { "degraded" },
        module: "csync-cut",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        record_store,
        running: RunningJobs {
            analysis: state.active_jobs.count(JobKind::Analysis),
            cut: state.active_jobs.count(JobKind::Cut),
        },
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
