//! Shared test fixtures: mock providers, mock LLM, in-memory database

#![allow(dead_code)]

use async_trait::async_trait;
use lyricmind::llm::{LlmBackend, LlmError, LlmResponse};
use lyricmind::services::FrameworkRegistry;
use lyricmind::types::{LyricsProvider, ProviderError, ProviderHit};
use lyricmind::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const VALID_LYRICS: &str = "Is this the real life? Is this just fantasy?\n\
    Caught in a landslide, no escape from reality\n\
    Open your eyes, look up to the skies and see\n\
    I'm just a poor boy, I need no sympathy";

/// In-memory SQLite pool with the cache schema
///
/// Single connection: every connection to `sqlite::memory:` is a new database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    lyricmind_common::db::init_schema(&pool).await.unwrap();
    pool
}

/// Write framework files into `dir`
pub fn write_frameworks(dir: &Path, frameworks: &[(&str, &str)]) {
    for (name, content) in frameworks {
        std::fs::write(dir.join(format!("{}.txt", name)), content).unwrap();
    }
}

/// What a scripted provider returns
#[derive(Clone)]
pub enum Script {
    Lyrics(String),
    Nothing,
    Error,
    Slow(Duration, String),
}

/// Provider with a fixed answer and a call counter
pub struct ScriptedProvider {
    name: &'static str,
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn confidence(&self) -> f64 {
        0.75
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    async fn search(&self, _artist: &str, _title: &str) -> Result<Option<ProviderHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Lyrics(text) => Ok(Some(
                ProviderHit::new(text.clone(), self.name, 0.75)
                    .with_extra("track_url", Some(serde_json::json!("https://example.test/song"))),
            )),
            Script::Nothing => Ok(None),
            Script::Error => Err(ProviderError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            }),
            Script::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(Some(ProviderHit::new(text.clone(), self.name, 0.75)))
            }
        }
    }
}

pub fn as_providers(providers: &[Arc<ScriptedProvider>]) -> Vec<Arc<dyn LyricsProvider>> {
    providers
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn LyricsProvider>)
        .collect()
}

/// LLM backend returning a fixed response and counting calls
pub struct CountingLlm {
    response: Result<LlmResponse, String>,
    calls: AtomicUsize,
}

impl CountingLlm {
    pub fn text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(LlmResponse::Text(text.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn structured(value: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(LlmResponse::Structured(value)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            response: Err("connection refused".to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for CountingLlm {
    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(LlmError::Connection)
    }
}

/// App state over an in-memory database and a framework directory
pub async fn app_state(
    providers: &[Arc<ScriptedProvider>],
    llm: Option<Arc<CountingLlm>>,
    framework_dir: &Path,
) -> AppState {
    AppState::from_parts(
        memory_pool().await,
        as_providers(providers),
        llm.map(|l| l as Arc<dyn LlmBackend>),
        FrameworkRegistry::load(framework_dir),
        "vanilla",
        Vec::new(),
    )
}
