//! Cache persistence
//!
//! Two stores share one SQLite pool: the lyrics cache and the analysis
//! cache. Both are evicted together by age.

pub mod analysis_cache;
pub mod keys;
pub mod lyrics_cache;

pub use analysis_cache::AnalysisCacheStore;
pub use keys::{content_hash, normalize_lyrics, search_key, AnalysisKey};
pub use lyrics_cache::LyricsCacheStore;

use lyricmind_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    lyricmind_common::db::init_database(db_path).await
}

/// Rows removed by an eviction sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionCounts {
    pub lyrics_deleted: u64,
    pub analysis_deleted: u64,
}

/// Delete cache rows in both tables created more than `days` days ago
///
/// Both deletes run in one transaction; on error nothing is removed.
pub async fn clear_old_cache(pool: &SqlitePool, days: u32) -> Result<EvictionCounts> {
    let cutoff = time::days_ago(days);
    let mut tx = pool.begin().await?;

    let lyrics_deleted = sqlx::query("DELETE FROM cached_lyrics WHERE created_at < ?")
        .bind(cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let analysis_deleted = sqlx::query("DELETE FROM cached_analysis WHERE created_at < ?")
        .bind(cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    tracing::info!(
        lyrics_deleted,
        analysis_deleted,
        days,
        "Cleared old cache entries"
    );

    Ok(EvictionCounts {
        lyrics_deleted,
        analysis_deleted,
    })
}
