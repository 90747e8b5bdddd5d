//! Lyrics cache store
//!
//! One row per normalized artist/title key. Writes are a single
//! `INSERT .. ON CONFLICT DO UPDATE`, so concurrent writers never leave a
//! partially written record and the last write wins.

use crate::db::keys::search_key;
use crate::types::LyricsRecord;
use lyricmind_common::{time, Result};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

/// Persistent artist/title → lyrics mapping
#[derive(Clone)]
pub struct LyricsCacheStore {
    pool: SqlitePool,
}

impl LyricsCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the cached record for an artist/title pair
    pub async fn get(&self, artist: &str, title: &str) -> Result<Option<LyricsRecord>> {
        let key = search_key(artist, title);

        let row = sqlx::query(
            r#"
            SELECT artist, title, lyrics, source, lyric_metadata
            FROM cached_lyrics
            WHERE search_key = ?
            "#,
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let metadata_json: Option<String> = row.get("lyric_metadata");
        let metadata = match metadata_json {
            Some(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(search_key = %key, error = %e, "Ignoring unreadable lyrics metadata");
                    Map::new()
                }
            },
            None => Map::new(),
        };

        Ok(Some(LyricsRecord {
            artist: row.get("artist"),
            title: row.get("title"),
            lyrics: row.get("lyrics"),
            source: row.get("source"),
            metadata,
        }))
    }

    /// Store (or overwrite) the record for its artist/title key
    pub async fn put(&self, record: &LyricsRecord) -> Result<()> {
        let key = search_key(&record.artist, &record.title);
        let metadata_json = if record.metadata.is_empty() {
            None
        } else {
            Some(Value::Object(record.metadata.clone()).to_string())
        };

        sqlx::query(
            r#"
            INSERT INTO cached_lyrics (
                search_key, artist, title, lyrics, source, lyric_metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(search_key) DO UPDATE SET
                artist = excluded.artist,
                title = excluded.title,
                lyrics = excluded.lyrics,
                source = excluded.source,
                lyric_metadata = excluded.lyric_metadata,
                created_at = excluded.created_at
            "#,
        )
        .bind(&key)
        .bind(&record.artist)
        .bind(&record.title)
        .bind(&record.lyrics)
        .bind(&record.source)
        .bind(metadata_json)
        .bind(time::now())
        .execute(&self.pool)
        .await?;

        debug!(
            artist = %record.artist,
            title = %record.title,
            source = %record.source,
            "Stored lyrics in cache"
        );

        Ok(())
    }
}
