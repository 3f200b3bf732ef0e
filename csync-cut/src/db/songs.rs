//! Song record persistence
//!
//! A job failure only writes its status column: a previously stored
//! analysis or cut survives a failed re-run.

use csync_common::models::{
    AnalysisResult, CutMetadata, JobKind, JobStatus, RawTagMap, RoutineType,
};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Collaborator, CutError, CutResult};

/// Fields supplied when a song is registered
#[derive(Debug, Clone, Deserialize)]
pub struct NewSong {
    pub user_id: String,
    pub project_id: String,
    pub original_filename: String,
    /// Object store key of the uploaded original
    pub storage_path: String,
}

/// One row of the `songs` table
#[derive(Debug, Clone, Serialize)]
pub struct SongRecord {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: String,
    pub original_filename: String,
    pub storage_path: String,
    pub original_duration_ms: Option<u64>,
    pub bpm: Option<f64>,
    pub analysis: Option<AnalysisResult>,
    pub analysis_status: JobStatus,
    pub routine_type: Option<RoutineType>,
    pub target_duration_ms: Option<u64>,
    pub section_tags: RawTagMap,
    pub cut_storage_path: Option<String>,
    pub cut_duration_ms: Option<u64>,
    pub cut_status: JobStatus,
    pub cut_metadata: Option<CutMetadata>,
    pub created_at: String,
    pub updated_at: String,
}

impl SongRecord {
    /// Object store key for this song's cut
    pub fn cut_storage_path(&self) -> String {
        format!("{}/{}/cuts/{}.mp3", self.user_id, self.project_id, self.id)
    }

    /// Extension of the original upload, used as a decoder hint
    pub fn original_extension(&self) -> Option<&str> {
        std::path::Path::new(&self.original_filename)
            .extension()
            .and_then(|e| e.to_str())
    }

    pub fn status(&self, kind: JobKind) -> JobStatus {
        match kind {
            JobKind::Analysis => self.analysis_status,
            JobKind::Cut => self.cut_status,
        }
    }
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> CutError {
    CutError::collaborator(
        Collaborator::RecordStore,
        anyhow::anyhow!("Corrupt {} column: {}", column, detail),
    )
}

fn parse_json<T: serde::de::DeserializeOwned>(column: &str, value: Option<String>) -> CutResult<Option<T>> {
    value
        .map(|json| serde_json::from_str(&json).map_err(|e| corrupt(column, e)))
        .transpose()
}

fn parse_status(column: &str, value: &str) -> CutResult<JobStatus> {
    JobStatus::parse(value).ok_or_else(|| corrupt(column, format!("unknown status {:?}", value)))
}

fn to_json<T: Serialize>(value: &T) -> CutResult<String> {
    serde_json::to_string(value).map_err(|e| CutError::collaborator(Collaborator::RecordStore, e))
}

fn song_from_row(row: &SqliteRow) -> CutResult<SongRecord> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str).map_err(|e| corrupt("id", e))?;

    let routine_type: Option<String> = row.get("routine_type");
    let section_tags: Option<RawTagMap> = parse_json("section_tags", row.get("section_tags"))?;

    Ok(SongRecord {
        id,
        user_id: row.get("user_id"),
        project_id: row.get("project_id"),
        original_filename: row.get("original_filename"),
        storage_path: row.get("storage_path"),
        original_duration_ms: row
            .get::<Option<i64>, _>("original_duration_ms")
            .map(|v| v.max(0) as u64),
        bpm: row.get("bpm"),
        analysis: parse_json("analysis", row.get("analysis"))?,
        analysis_status: parse_status("analysis_status", row.get("analysis_status"))?,
        routine_type: routine_type.as_deref().and_then(RoutineType::parse),
        target_duration_ms: row
            .get::<Option<i64>, _>("target_duration_ms")
            .map(|v| v.max(0) as u64),
        section_tags: section_tags.unwrap_or_default(),
        cut_storage_path: row.get("cut_storage_path"),
        cut_duration_ms: row
            .get::<Option<i64>, _>("cut_duration_ms")
            .map(|v| v.max(0) as u64),
        cut_status: parse_status("cut_status", row.get("cut_status"))?,
        cut_metadata: parse_json("cut_metadata", row.get("cut_metadata"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new song with idle job statuses
pub async fn create_song(pool: &SqlitePool, song: &NewSong) -> CutResult<SongRecord> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO songs (id, user_id, project_id, original_filename, storage_path)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&song.user_id)
    .bind(&song.project_id)
    .bind(&song.original_filename)
    .bind(&song.storage_path)
    .execute(pool)
    .await?;

    tracing::info!(song_id = %id, filename = %song.original_filename, "Song registered");

    require_song(pool, id).await
}

pub async fn load_song(pool: &SqlitePool, id: Uuid) -> CutResult<Option<SongRecord>> {
    let row = sqlx::query("SELECT * FROM songs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Load a song or fail with [`CutError::SongNotFound`]
pub async fn require_song(pool: &SqlitePool, id: Uuid) -> CutResult<SongRecord> {
    load_song(pool, id).await?.ok_or(CutError::SongNotFound(id))
}

/// Replace the section tags; returns false if the song does not exist
pub async fn set_section_tags(pool: &SqlitePool, id: Uuid, tags: &RawTagMap) -> CutResult<bool> {
    let result = sqlx::query(
        "UPDATE songs SET section_tags = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(to_json(tags)?)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set routine type and target duration; returns false if the song does not exist
pub async fn set_target(
    pool: &SqlitePool,
    id: Uuid,
    routine_type: Option<RoutineType>,
    target_duration_ms: u64,
) -> CutResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET routine_type = ?, target_duration_ms = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(routine_type.map(|r| r.as_str()))
    .bind(target_duration_ms as i64)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write only the status column of `kind`
pub async fn set_job_status(
    pool: &SqlitePool,
    id: Uuid,
    kind: JobKind,
    status: JobStatus,
) -> CutResult<()> {
    let sql = format!(
        "UPDATE songs SET {} = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        kind.status_column()
    );
    let result = sqlx::query(&sql)
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CutError::SongNotFound(id));
    }

    tracing::debug!(song_id = %id, job = %kind, status = %status, "Job status updated");
    Ok(())
}

/// Persist a finished analysis and mark the analysis job ready
pub async fn complete_analysis(
    pool: &SqlitePool,
    id: Uuid,
    analysis: &AnalysisResult,
    original_duration_ms: u64,
) -> CutResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET analysis = ?, bpm = ?, original_duration_ms = ?, analysis_status = 'ready',
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(to_json(analysis)?)
    .bind(analysis.bpm)
    .bind(original_duration_ms as i64)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CutError::SongNotFound(id));
    }
    Ok(())
}

/// Persist a finished cut and mark the cut job ready
pub async fn complete_cut(
    pool: &SqlitePool,
    id: Uuid,
    cut_storage_path: &str,
    metadata: &CutMetadata,
) -> CutResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET cut_storage_path = ?, cut_duration_ms = ?, cut_metadata = ?, cut_status = 'ready',
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(cut_storage_path)
    .bind(metadata.final_duration_ms as i64)
    .bind(to_json(metadata)?)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CutError::SongNotFound(id));
    }
    Ok(())
}
