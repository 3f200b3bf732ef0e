//! Song record and job trigger handlers
//!
//! - POST /songs
//! - GET /songs/:id
//! - PUT /songs/:id/tags
//! - PUT /songs/:id/target
//! - POST /songs/:id/analyze
//! - POST /songs/:id/generate

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use csync_common::models::{JobKind, JobStatus, RawTagMap, RoutineType, SectionTag};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::songs::{self, NewSong, SongRecord};
use crate::error::{ApiError, ApiResult};
use crate::workflow::{run_analysis, run_cut, ActiveJobGuard};
use crate::AppState;

/// PUT /songs/:id/target request
///
/// An explicit `target_duration_ms` wins over the routine preset.
#[derive(Debug, Deserialize)]
pub struct SetTargetRequest {
    #[serde(default)]
    pub routine_type: Option<RoutineType>,
    #[serde(default)]
    pub target_duration_ms: Option<u64>,
}

/// 202 response of the job triggers
#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub song_id: Uuid,
    pub job: JobKind,
    pub status: JobStatus,
}

/// POST /songs
pub async fn create_song(
    State(state): State<AppState>,
    Json(request): Json<NewSong>,
) -> ApiResult<(StatusCode, Json<SongRecord>)> {
    for (field, value) in [
        ("user_id", &request.user_id),
        ("project_id", &request.project_id),
        ("storage_path", &request.storage_path),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
        }
    }

    let song = songs::create_song(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// GET /songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
) -> ApiResult<Json<SongRecord>> {
    Ok(Json(songs::require_song(&state.db, song_id).await?))
}

/// PUT /songs/:id/tags
///
/// Replaces the whole tag map. Tag strings are validated here; rows written
/// by other clients may still hold unknown strings, which the cut job
/// ignores.
pub async fn set_tags(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
    Json(tags): Json<RawTagMap>,
) -> ApiResult<Json<SongRecord>> {
    let mut invalid: Vec<&str> = tags
        .iter()
        .filter(|(_, tag)| SectionTag::parse(tag).is_none())
        .map(|(name, _)| name.as_str())
        .collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        return Err(ApiError::BadRequest(format!(
            "Unknown tag for sections: {}",
            invalid.join(", ")
        )));
    }

    if !songs::set_section_tags(&state.db, song_id, &tags).await? {
        return Err(ApiError::NotFound(format!("Song not found: {}", song_id)));
    }
    Ok(Json(songs::require_song(&state.db, song_id).await?))
}

/// PUT /songs/:id/target
pub async fn set_target(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
    Json(request): Json<SetTargetRequest>,
) -> ApiResult<Json<SongRecord>> {
    let target_ms = resolve_target(&request)?;

    if !songs::set_target(&state.db, song_id, request.routine_type, target_ms).await? {
        return Err(ApiError::NotFound(format!("Song not found: {}", song_id)));
    }
    Ok(Json(songs::require_song(&state.db, song_id).await?))
}

fn resolve_target(request: &SetTargetRequest) -> ApiResult<u64> {
    let target = match (request.target_duration_ms, request.routine_type) {
        (Some(ms), _) => ms,
        (None, Some(routine)) => routine.target_duration_ms().ok_or_else(|| {
            ApiError::BadRequest("custom routine requires target_duration_ms".to_string())
        })?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "routine_type or target_duration_ms required".to_string(),
            ))
        }
    };

    if target == 0 {
        return Err(ApiError::BadRequest(
            "target_duration_ms must be positive".to_string(),
        ));
    }
    Ok(target)
}

/// POST /songs/:id/analyze
pub async fn start_analysis(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    songs::require_song(&state.db, song_id).await?;

    let guard = claim_job(&state, song_id, JobKind::Analysis)?;
    spawn_job(state, guard, song_id, JobKind::Analysis);

    Ok(accepted(song_id, JobKind::Analysis))
}

/// POST /songs/:id/generate
///
/// 400 unless the analysis is ready and a target is set.
pub async fn start_cut(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let song = songs::require_song(&state.db, song_id).await?;

    if song.analysis_status != JobStatus::Ready || song.analysis.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Song {} has not been analyzed (analysis status: {})",
            song_id, song.analysis_status
        )));
    }
    if song.target_duration_ms.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Song {} has no target duration",
            song_id
        )));
    }

    let guard = claim_job(&state, song_id, JobKind::Cut)?;
    spawn_job(state, guard, song_id, JobKind::Cut);

    Ok(accepted(song_id, JobKind::Cut))
}

fn claim_job(state: &AppState, song_id: Uuid, kind: JobKind) -> ApiResult<ActiveJobGuard> {
    state.active_jobs.try_start(song_id, kind).ok_or_else(|| {
        ApiError::Conflict(format!("{} job already running for song {}", kind, song_id))
    })
}

fn accepted(song_id: Uuid, job: JobKind) -> (StatusCode, Json<JobAccepted>) {
    (
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            song_id,
            job,
            status: JobStatus::Running,
        }),
    )
}

/// Run the job in the background; the guard is held until it finishes
fn spawn_job(state: AppState, guard: ActiveJobGuard, song_id: Uuid, kind: JobKind) {
    tokio::spawn(async move {
        let _guard = guard;

        let result = match kind {
            JobKind::Analysis => run_analysis(&state.jobs, song_id).await.map(|_| ()),
            JobKind::Cut => run_cut(&state.jobs, song_id).await.map(|_| ()),
        };

        if let Err(e) = result {
            *state.last_error.write().await = Some(format!("{} job for {}: {}", kind, song_id, e));
        }
    });
}

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs", post(create_song))
        .route("/songs/:id", get(get_song))
        .route("/songs/:id/tags", put(set_tags))
        .route("/songs/:id/target", put(set_target))
        .route("/songs/:id/analyze", post(start_analysis))
        .route("/songs/:id/generate", post(start_cut))
}
