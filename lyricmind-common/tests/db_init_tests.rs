//! Integration tests for cache database initialization

use lyricmind_common::db::init::{init_database, init_schema};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("lyrics.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("lyrics.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("lyrics.db");
    let pool = init_database(&db_path).await.unwrap();

    let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_lyrics_search_key_is_unique() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pool = init_database(&temp_dir.path().join("lyrics.db")).await.unwrap();

    let insert = "INSERT INTO cached_lyrics (search_key, artist, title, lyrics, source, created_at) \
                  VALUES ('k1', 'a', 't', 'l', 's', CURRENT_TIMESTAMP)";
    sqlx::query(insert).execute(&pool).await.unwrap();
    let duplicate = sqlx::query(insert).execute(&pool).await;

    assert!(duplicate.is_err(), "Duplicate search_key must violate UNIQUE constraint");
}

#[tokio::test]
async fn test_analysis_key_allows_other_versions() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();

    for version in ["1.0", "1.1"] {
        sqlx::query(
            "INSERT INTO cached_analysis (content_hash, framework, framework_version, result, created_at) \
             VALUES ('h', 'vanilla', ?, '{}', CURRENT_TIMESTAMP)",
        )
        .bind(version)
        .execute(&pool)
        .await
        .unwrap();
    }

    let duplicate = sqlx::query(
        "INSERT INTO cached_analysis (content_hash, framework, framework_version, result, created_at) \
         VALUES ('h', 'vanilla', '1.0', '{}', CURRENT_TIMESTAMP)",
    )
    .execute(&pool)
    .await;
    assert!(duplicate.is_err());
}
