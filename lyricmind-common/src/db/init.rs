//! Database initialization
//!
//! Opens (or creates) the SQLite cache database and makes sure both cache
//! tables exist. Safe to call on every startup.
//!
//! Tables:
//! - `cached_lyrics`: one row per normalized artist/title search key
//! - `cached_analysis`: one row per (content hash, framework, framework version)

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all cache tables (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_cached_lyrics_table(pool).await?;
    create_cached_analysis_table(pool).await?;
    Ok(())
}

/// Lyrics cache: unique key is the hash of normalized `artist:title`
pub async fn create_cached_lyrics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cached_lyrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            search_key TEXT NOT NULL UNIQUE,
            artist TEXT NOT NULL,
            title TEXT NOT NULL,
            lyrics TEXT NOT NULL,
            source TEXT NOT NULL,
            lyric_metadata TEXT,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_cached_lyrics_created_at ON cached_lyrics(created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Analysis cache: unique key is (content_hash, framework, framework_version)
pub async fn create_cached_analysis_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cached_analysis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_hash TEXT NOT NULL,
            framework TEXT NOT NULL,
            framework_version TEXT NOT NULL,
            result TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE(content_hash, framework, framework_version)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_cached_analysis_created_at ON cached_analysis(created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_tables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("lyrics.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'cached_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, vec!["cached_analysis", "cached_lyrics"]);
    }

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("lyrics.db");

        let pool = init_database(&db_path).await.unwrap();
        pool.close().await;

        // Second open must not fail on existing tables
        let pool = init_database(&db_path).await.unwrap();
        init_schema(&pool).await.unwrap();
    }
}
