//! Core types and the lyrics provider trait
//!
//! A provider wraps one external lyrics source. Providers are stateless:
//! no caching happens inside them, and an ordinary "no lyrics for this song"
//! is `Ok(None)`, never an error. Errors are reserved for faults (network,
//! auth, malformed payloads) and are absorbed by the discovery engine so a
//! single misbehaving provider cannot abort the fallback chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// Lyrics Records
// ============================================================================

/// Unified lyrics record returned by discovery and stored in the lyrics cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsRecord {
    pub artist: String,
    pub title: String,
    pub lyrics: String,
    /// Provider source tag (e.g. "musixmatch", "genius", "lyrics_ovh")
    pub source: String,
    /// Provider metadata: confidence, track_url, provider-specific ids
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl LyricsRecord {
    /// Confidence assigned by the provider, if recorded
    pub fn confidence(&self) -> Option<f64> {
        self.metadata.get("confidence").and_then(Value::as_f64)
    }
}

/// Successful provider lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHit {
    pub lyrics: String,
    pub source: String,
    /// Data-quality trust in this source (0.0-1.0)
    pub confidence: f64,
    /// Provider-specific fields; `None` values are dropped on merge
    pub extra: Vec<(String, Option<Value>)>,
}

impl ProviderHit {
    pub fn new(lyrics: impl Into<String>, source: impl Into<String>, confidence: f64) -> Self {
        Self {
            lyrics: lyrics.into(),
            source: source.into(),
            confidence: confidence.clamp(0.0, 1.0),
            extra: Vec::new(),
        }
    }

    /// Attach a provider-specific metadata field
    pub fn with_extra(mut self, key: impl Into<String>, value: Option<Value>) -> Self {
        self.extra.push((key.into(), value));
        self
    }

    /// Merge into a unified record for the requested artist/title
    pub fn into_record(self, artist: &str, title: &str) -> LyricsRecord {
        let mut metadata = Map::new();
        metadata.insert("confidence".to_string(), Value::from(self.confidence));
        for (key, value) in self.extra {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                metadata.insert(key, value);
            }
        }

        LyricsRecord {
            artist: artist.to_string(),
            title: title.to_string(),
            lyrics: self.lyrics,
            source: self.source,
            metadata,
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Provider faults (never surfaced past the discovery engine)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// One external lyrics source
///
/// # Example
/// ```rust,ignore
/// use lyricmind::types::{LyricsProvider, ProviderHit, ProviderError};
///
/// pub struct StaticProvider;
///
/// #[async_trait::async_trait]
/// impl LyricsProvider for StaticProvider {
///     fn name(&self) -> &'static str { "static" }
///     fn confidence(&self) -> f64 { 0.5 }
///     fn requires_credentials(&self) -> bool { false }
///
///     async fn search(&self, artist: &str, title: &str) -> Result<Option<ProviderHit>, ProviderError> {
///         Ok(Some(ProviderHit::new("...", "static", 0.5)))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Source tag for logging and provenance
    fn name(&self) -> &'static str;

    /// Confidence assigned to hits from this source
    fn confidence(&self) -> f64;

    /// Whether this source needs an API key or token
    fn requires_credentials(&self) -> bool;

    /// Look up lyrics for one song
    ///
    /// # Returns
    /// `Ok(Some(hit))` on a match, `Ok(None)` when the source has no lyrics
    ///
    /// # Errors
    /// `ProviderError` for network, auth, or payload faults
    async fn search(&self, artist: &str, title: &str)
        -> Result<Option<ProviderHit>, ProviderError>;
}

/// Provider description for listings
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub confidence: f64,
    pub requires_credentials: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_merges_extra_fields_and_drops_nulls() {
        let hit = ProviderHit::new("la la la", "genius", 0.9)
            .with_extra("genius_id", Some(json!(42)))
            .with_extra("track_url", None)
            .with_extra("copyright_info", Some(Value::Null));

        let record = hit.into_record("Queen", "Bohemian Rhapsody");

        assert_eq!(record.artist, "Queen");
        assert_eq!(record.source, "genius");
        assert_eq!(record.confidence(), Some(0.9));
        assert_eq!(record.metadata.get("genius_id"), Some(&json!(42)));
        assert!(!record.metadata.contains_key("track_url"));
        assert!(!record.metadata.contains_key("copyright_info"));
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(ProviderHit::new("x", "s", 1.7).confidence, 1.0);
        assert_eq!(ProviderHit::new("x", "s", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_record_serializes_metadata_flat() {
        let record = ProviderHit::new("words", "lyrics_ovh", 0.7).into_record("A", "B");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["source"], "lyrics_ovh");
        assert_eq!(value["confidence"], json!(0.7));
        assert!(value.get("metadata").is_none());
    }
}
