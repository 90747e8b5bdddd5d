//! lyricmind library interface
//!
//! Lyrics discovery across ranked providers with a SQLite cache, and
//! framework-versioned LLM analysis with its own cache. The binary wires
//! these into an HTTP API and a CLI; integration tests use the same
//! [`AppState`] and [`build_router`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod providers;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use crate::db::{AnalysisCacheStore, LyricsCacheStore};
use crate::llm::LlmBackend;
use crate::services::{AnalysisEngine, DiscoveryEngine, FrameworkRegistry};
use crate::types::LyricsProvider;
use axum::Router;
use chrono::{DateTime, Utc};
use lyricmind_common::config::TomlConfig;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Songs with an analysis in flight, keyed by normalized `artist:title`
#[derive(Clone, Default)]
pub struct ActiveSongs {
    inner: Arc<Mutex<HashSet<String>>>,
}

/// Holds a song's slot in [`ActiveSongs`] until dropped
pub struct ActiveSongGuard {
    songs: ActiveSongs,
    key: String,
}

impl ActiveSongs {
    fn key(artist: &str, title: &str) -> String {
        format!(
            "{}:{}",
            artist.trim().to_lowercase(),
            title.trim().to_lowercase()
        )
    }

    /// Claim a song; `None` if it is already being processed
    pub fn try_acquire(&self, artist: &str, title: &str) -> Option<ActiveSongGuard> {
        let key = Self::key(artist, title);
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.clone()) {
            return None;
        }
        Some(ActiveSongGuard {
            songs: self.clone(),
            key,
        })
    }

    pub fn contains(&self, artist: &str, title: &str) -> bool {
        let set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(&Self::key(artist, title))
    }
}

impl Drop for ActiveSongGuard {
    fn drop(&mut self) {
        let mut set = self.songs.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.key);
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Cache database pool
    pub db: SqlitePool,
    pub discovery: Arc<DiscoveryEngine>,
    pub analyzer: Arc<AnalysisEngine>,
    /// In-progress guard for analyze-song requests
    pub active_songs: ActiveSongs,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Startup problems reported by the health check
    pub issues: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        discovery: Arc<DiscoveryEngine>,
        analyzer: Arc<AnalysisEngine>,
        issues: Vec<String>,
    ) -> Self {
        Self {
            db,
            discovery,
            analyzer,
            active_songs: ActiveSongs::default(),
            startup_time: Utc::now(),
            issues: Arc::new(issues),
        }
    }

    /// Assemble engines from their parts
    ///
    /// Used by the binary and by tests that inject mock providers or LLMs.
    pub fn from_parts(
        db: SqlitePool,
        providers: Vec<Arc<dyn LyricsProvider>>,
        llm: Option<Arc<dyn LlmBackend>>,
        frameworks: FrameworkRegistry,
        default_framework: &str,
        issues: Vec<String>,
    ) -> Self {
        Self::assemble(db, providers, llm, None, frameworks, default_framework, issues)
    }

    fn assemble(
        db: SqlitePool,
        providers: Vec<Arc<dyn LyricsProvider>>,
        llm: Option<Arc<dyn LlmBackend>>,
        llm_unavailable_reason: Option<String>,
        frameworks: FrameworkRegistry,
        default_framework: &str,
        issues: Vec<String>,
    ) -> Self {
        let discovery = DiscoveryEngine::new(providers, LyricsCacheStore::new(db.clone()));
        let mut analyzer = AnalysisEngine::new(
            llm,
            Arc::new(frameworks),
            AnalysisCacheStore::new(db.clone()),
            default_framework,
        );
        if let Some(reason) = llm_unavailable_reason {
            analyzer = analyzer.with_llm_unavailable_reason(reason);
        }
        Self::new(db, Arc::new(discovery), Arc::new(analyzer), issues)
    }

    /// Build the full service from resolved configuration
    ///
    /// A failing LLM backend does not abort startup: the state is created
    /// without one and the problem is reported as a health issue.
    ///
    /// # Errors
    /// Database initialization or provider client construction failures
    pub async fn from_config(config: &TomlConfig) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        info!("Database: {}", db_path.display());
        let db = db::init_database_pool(&db_path).await?;

        let providers = providers::build_providers(&config.providers)?;
        let frameworks = FrameworkRegistry::load(&config.framework.directory);

        let mut issues = Vec::new();
        let (llm, llm_unavailable_reason) = match llm::create_backend(&config.llm) {
            Ok(backend) => (Some(backend), None),
            Err(e) => {
                warn!(error = %e, "LLM backend unavailable, analysis is disabled");
                issues.push(format!("LLM backend unavailable: {}", e));
                (None, Some(e.to_string()))
            }
        };
        if frameworks.is_empty() {
            issues.push(format!(
                "No frameworks loaded from {}",
                config.framework.directory.display()
            ));
        }

        Ok(Self::assemble(
            db,
            providers,
            llm,
            llm_unavailable_reason,
            frameworks,
            &config.framework.default,
            issues,
        ))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::discovery_routes())
        .merge(api::analyzer_routes())
        .merge(api::cache_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_song_guard_releases_on_drop() {
        let songs = ActiveSongs::default();

        let guard = songs.try_acquire("Queen", "Innuendo").unwrap();
        assert!(songs.try_acquire(" queen", "INNUENDO ").is_none());
        assert!(songs.contains("Queen", "Innuendo"));

        drop(guard);
        assert!(!songs.contains("Queen", "Innuendo"));
        assert!(songs.try_acquire("Queen", "Innuendo").is_some());
    }
}
