//! Database initialization
//!
//! Opens (or creates) the SQLite record store and applies the idempotent
//! schema for song records.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database at `db_path`, creating file and tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the API read records while a job writes status updates
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_songs_table(&pool).await?;

    Ok(pool)
}

/// Create the `songs` table (idempotent)
///
/// JSON columns: `analysis` (AnalysisResult), `section_tags` (name → tag),
/// `cut_metadata` (CutMetadata).
pub async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            original_duration_ms INTEGER,
            bpm REAL,
            analysis TEXT,
            analysis_status TEXT NOT NULL DEFAULT 'idle',
            routine_type TEXT,
            target_duration_ms INTEGER,
            section_tags TEXT NOT NULL DEFAULT '{}',
            cut_storage_path TEXT,
            cut_duration_ms INTEGER,
            cut_status TEXT NOT NULL DEFAULT 'idle',
            cut_metadata TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_project ON songs(project_id)")
        .execute(pool)
        .await?;

    Ok(())
}
