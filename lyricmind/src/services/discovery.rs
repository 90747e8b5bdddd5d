//! Lyrics discovery engine
//!
//! Cache first, then providers in their fixed preference order. The first
//! hit that passes quality validation is written to the lyrics cache and
//! returned. Provider faults (errors, timeouts, panics) are logged and the
//! next provider is tried; they never reach the caller.
//!
//! Exhausting every provider is a normal outcome (`Ok(None)`), not an error.

use crate::db::LyricsCacheStore;
use crate::services::quality::validate_lyrics;
use crate::types::{LyricsProvider, LyricsRecord, ProviderInfo};
use futures::FutureExt;
use lyricmind_common::{Error, Result};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for one provider call, including all of its HTTP requests
pub const DEFAULT_PROVIDER_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrates cache lookup, provider fallback, validation and cache write
pub struct DiscoveryEngine {
    providers: Vec<Arc<dyn LyricsProvider>>,
    cache: LyricsCacheStore,
    call_timeout: Duration,
}

impl DiscoveryEngine {
    /// Create an engine; `providers` order is the preference order
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>, cache: LyricsCacheStore) -> Self {
        if providers.is_empty() {
            warn!("No lyrics providers are configured");
        }
        Self {
            providers,
            cache,
            call_timeout: DEFAULT_PROVIDER_CALL_TIMEOUT,
        }
    }

    /// Override the per-provider call timeout
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Active providers in the order they are tried
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                name: p.name().to_string(),
                confidence: p.confidence(),
                requires_credentials: p.requires_credentials(),
            })
            .collect()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Find lyrics for a song
    ///
    /// # Arguments
    /// * `force_refresh` - skip the cache lookup and query providers again
    ///
    /// # Returns
    /// `Ok(None)` when no provider yields valid lyrics
    ///
    /// # Errors
    /// `Error::InvalidInput` for a blank artist or title, `Error::Database`
    /// when the cache cannot be read or written
    pub async fn search_lyrics(
        &self,
        artist: &str,
        title: &str,
        force_refresh: bool,
    ) -> Result<Option<LyricsRecord>> {
        if artist.trim().is_empty() || title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "artist and title must not be empty".to_string(),
            ));
        }

        if !force_refresh {
            if let Some(cached) = self.cache.get(artist, title).await? {
                info!(
                    artist = %artist,
                    title = %title,
                    source = %cached.source,
                    "Found cached lyrics"
                );
                return Ok(Some(cached));
            }
        }

        for provider in &self.providers {
            let name = provider.name();
            debug!(provider = name, artist = %artist, title = %title, "Searching provider");

            let call = AssertUnwindSafe(provider.search(artist, title)).catch_unwind();
            let hit = match tokio::time::timeout(self.call_timeout, call).await {
                Ok(Ok(Ok(Some(hit)))) => hit,
                Ok(Ok(Ok(None))) => {
                    debug!(provider = name, artist = %artist, title = %title, "Provider has no lyrics");
                    continue;
                }
                Ok(Ok(Err(e))) => {
                    warn!(provider = name, artist = %artist, title = %title, error = %e, "Provider failed");
                    continue;
                }
                Ok(Err(_panic)) => {
                    warn!(provider = name, artist = %artist, title = %title, "Provider panicked");
                    continue;
                }
                Err(_) => {
                    warn!(
                        provider = name,
                        artist = %artist,
                        title = %title,
                        timeout_secs = self.call_timeout.as_secs(),
                        "Provider timed out"
                    );
                    continue;
                }
            };

            if let Err(issue) = validate_lyrics(&hit.lyrics) {
                info!(
                    provider = name,
                    artist = %artist,
                    title = %title,
                    reason = %issue,
                    "Provider lyrics rejected by quality validation"
                );
                continue;
            }

            let record = hit.into_record(artist, title);
            self.cache.put(&record).await?;

            info!(
                provider = name,
                source = %record.source,
                artist = %artist,
                title = %title,
                "Found lyrics"
            );
            return Ok(Some(record));
        }

        warn!(artist = %artist, title = %title, "No valid lyrics found after trying all providers");
        Ok(None)
    }
}

// ============================================================================
// Mock Providers for Testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use crate::types::{LyricsProvider, ProviderError, ProviderHit};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What a mock provider does when searched
    pub enum Behavior {
        Hit(String),
        Miss,
        Fail,
        Panic,
        Hang,
    }

    pub struct MockProvider {
        pub name: &'static str,
        pub behavior: Behavior,
        pub calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(name: &'static str, behavior: Behavior) -> Self {
            Self {
                name,
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LyricsProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn confidence(&self) -> f64 {
            0.5
        }

        fn requires_credentials(&self) -> bool {
            false
        }

        async fn search(
            &self,
            _artist: &str,
            _title: &str,
        ) -> Result<Option<ProviderHit>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Hit(text) => Ok(Some(ProviderHit::new(text.clone(), self.name, 0.5))),
                Behavior::Miss => Ok(None),
                Behavior::Fail => Err(ProviderError::Network("mock failure".to_string())),
                Behavior::Panic => panic!("mock provider panic"),
                Behavior::Hang => {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }
}
