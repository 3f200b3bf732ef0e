//! Database Test Utilities

use anyhow::Result;
use csync_cut::db::songs::{self, NewSong};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

/// Create temporary test database with the songs schema
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_csync.db");
    let pool = csync_common::db::init_database(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Register a song for `user-1/project-1` pointing at `storage_path`
pub async fn create_song(pool: &SqlitePool, storage_path: &str) -> Uuid {
    let file_name = storage_path.rsplit('/').next().unwrap_or(storage_path);
    songs::create_song(
        pool,
        &NewSong {
            user_id: "user-1".to_string(),
            project_id: "project-1".to_string(),
            original_filename: file_name.to_string(),
            storage_path: storage_path.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}
