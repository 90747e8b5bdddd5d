//! lyrics.ovh provider (free, no credentials)

use crate::types::{LyricsProvider, ProviderError, ProviderHit};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::info;

const LYRICS_OVH_BASE_URL: &str = "https://api.lyrics.ovh/v1";
const CONFIDENCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct OvhResponse {
    #[serde(default)]
    lyrics: String,
}

pub struct LyricsOvhProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LyricsOvhProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: LYRICS_OVH_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/{artist}/{title}` with both segments percent-encoded
    fn lookup_url(&self, artist: &str, title: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Network(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Network("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(artist)
            .push(title);
        Ok(url)
    }
}

/// Trim every line and the whole text
pub fn clean_lyrics(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[async_trait]
impl LyricsProvider for LyricsOvhProvider {
    fn name(&self) -> &'static str {
        "lyrics_ovh"
    }

    fn confidence(&self) -> f64 {
        CONFIDENCE
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    async fn search(&self, artist: &str, title: &str) -> Result<Option<ProviderHit>, ProviderError> {
        if artist.trim().is_empty() || title.trim().is_empty() {
            return Ok(None);
        }

        let url = self.lookup_url(artist, title)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!(artist = %artist, title = %title, "lyrics.ovh: no lyrics found (404)");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: OvhResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let lyrics = clean_lyrics(&body.lyrics);
        if lyrics.is_empty() {
            return Ok(None);
        }

        Ok(Some(ProviderHit::new(lyrics, self.name(), CONFIDENCE)))
    }
}
