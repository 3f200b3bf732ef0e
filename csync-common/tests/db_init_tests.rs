//! Database initialization tests

use csync_common::db::init::init_database;
use sqlx::Row;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("csync.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("csync.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_songs_table_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("csync.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO songs (id, user_id, project_id, original_filename, storage_path)
         VALUES ('s1', 'u1', 'p1', 'track.mp3', 'u1/p1/track.mp3')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let row = sqlx::query(
        "SELECT analysis_status, cut_status, section_tags, cut_metadata FROM songs WHERE id = 's1'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(row.get::<String, _>("analysis_status"), "idle");
    assert_eq!(row.get::<String, _>("cut_status"), "idle");
    assert_eq!(row.get::<String, _>("section_tags"), "{}");
    assert!(row.get::<Option<String>, _>("cut_metadata").is_none());
}
