//! Cache key derivation
//!
//! Both keys are lowercase hex SHA-256 digests.
//! - Lyrics: `lower(trim(artist)) + ":" + lower(trim(title))`, so case and
//!   surrounding whitespace never change identity.
//! - Analysis: normalized lyrics + framework name + framework version. Bumping
//!   a framework's version always yields a new key.

use sha2::{Digest, Sha256};

/// Lyrics cache key for an artist/title pair
pub fn search_key(artist: &str, title: &str) -> String {
    let key_string = format!(
        "{}:{}",
        artist.trim().to_lowercase(),
        title.trim().to_lowercase()
    );
    format!("{:x}", Sha256::digest(key_string.as_bytes()))
}

/// Strip blank lines and per-line surrounding whitespace
pub fn normalize_lyrics(lyrics: &str) -> String {
    lyrics
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Content hash for the analysis cache
pub fn content_hash(lyrics: &str, framework: &str, version: &str) -> String {
    let hash_input = format!("{}:{}:{}", normalize_lyrics(lyrics), framework, version);
    format!("{:x}", Sha256::digest(hash_input.as_bytes()))
}

/// Full analysis cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub content_hash: String,
    pub framework: String,
    pub framework_version: String,
}

impl AnalysisKey {
    pub fn new(lyrics: &str, framework: &str, framework_version: &str) -> Self {
        Self {
            content_hash: content_hash(lyrics, framework, framework_version),
            framework: framework.to_string(),
            framework_version: framework_version.to_string(),
        }
    }
}
