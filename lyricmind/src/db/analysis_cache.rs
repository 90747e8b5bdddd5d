//! Analysis cache store
//!
//! Keyed by (content hash, framework, framework version). A framework version
//! bump therefore misses the cache even for identical lyrics; results from the
//! old version stay until the age-based sweep removes them.

use crate::db::keys::AnalysisKey;
use lyricmind_common::{time, Error, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Persistent analysis-key → structured result mapping
#[derive(Clone)]
pub struct AnalysisCacheStore {
    pool: SqlitePool,
}

impl AnalysisCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a cached analysis result
    ///
    /// An unreadable stored result is treated as a miss so the next
    /// successful analysis overwrites it.
    pub async fn get(&self, key: &AnalysisKey) -> Result<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT result FROM cached_analysis
            WHERE content_hash = ? AND framework = ? AND framework_version = ?
            "#,
        )
        .bind(&key.content_hash)
        .bind(&key.framework)
        .bind(&key.framework_version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((text,)) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(
                        framework = %key.framework,
                        version = %key.framework_version,
                        error = %e,
                        "Cached analysis is not valid JSON, treating as miss"
                    );
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Store (or overwrite) an analysis result
    pub async fn put(&self, key: &AnalysisKey, result: &Value) -> Result<()> {
        let result_json = serde_json::to_string(result)
            .map_err(|e| Error::Internal(format!("Serialize analysis result failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO cached_analysis (
                content_hash, framework, framework_version, result, created_at
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(content_hash, framework, framework_version) DO UPDATE SET
                result = excluded.result,
                created_at = excluded.created_at
            "#,
        )
        .bind(&key.content_hash)
        .bind(&key.framework)
        .bind(&key.framework_version)
        .bind(result_json)
        .bind(time::now())
        .execute(&self.pool)
        .await?;

        debug!(
            framework = %key.framework,
            version = %key.framework_version,
            "Stored analysis in cache"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> AnalysisCacheStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        lyricmind_common::db::init_schema(&pool).await.unwrap();
        AnalysisCacheStore::new(pool)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = test_store().await;
        let key = AnalysisKey::new("some lyrics", "vanilla", "1.0");
        let result = json!({"mood": "happy", "themes": ["love", "loss"]});

        store.put(&key, &result).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(result));
    }

    #[tokio::test]
    async fn test_version_bump_misses() {
        let store = test_store().await;
        let v1 = AnalysisKey::new("some lyrics", "vanilla", "1.0");
        let v2 = AnalysisKey::new("some lyrics", "vanilla", "1.1");

        store.put(&v1, &json!({"mood": "happy"})).await.unwrap();

        assert!(store.get(&v2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = test_store().await;
        let key = AnalysisKey::new("some lyrics", "vanilla", "1.0");

        store.put(&key, &json!({"mood": "happy"})).await.unwrap();
        store.put(&key, &json!({"mood": "sad"})).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(json!({"mood": "sad"})));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_a_miss() {
        let store = test_store().await;
        let key = AnalysisKey::new("some lyrics", "vanilla", "1.0");
        sqlx::query(
            "INSERT INTO cached_analysis (content_hash, framework, framework_version, result, created_at) \
             VALUES (?, ?, ?, 'not json', CURRENT_TIMESTAMP)",
        )
        .bind(&key.content_hash)
        .bind(&key.framework)
        .bind(&key.framework_version)
        .execute(&store.pool)
        .await
        .unwrap();

        assert!(store.get(&key).await.unwrap().is_none());
    }
}
