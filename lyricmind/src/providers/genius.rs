//! Genius lyrics provider
//!
//! The Genius API only returns song metadata. Lyrics are scraped from the
//! song page: every `data-lyrics-container="true"` element is flattened to
//! text, then section markers (`[Chorus]`) and blank lines are removed.

use crate::types::{LyricsProvider, ProviderError, ProviderHit};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const GENIUS_API_BASE_URL: &str = "https://api.genius.com";
const CONFIDENCE: f64 = 0.9;
const CONTAINER_MARKER: &str = "data-lyrics-container=\"true\"";

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[.*\]\n?").expect("valid regex"));
static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// Hits mix songs with other result types; only song results are decoded
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "type")]
    hit_type: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct SongResult {
    id: u64,
    url: String,
    primary_artist: Option<PrimaryArtist>,
}

#[derive(Debug, Clone, Deserialize)]
struct PrimaryArtist {
    name: String,
}

/// Genius API client
pub struct GeniusProvider {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GeniusProvider {
    pub fn new(client: reqwest::Client, token: String) -> Self {
        Self {
            client,
            token,
            base_url: GENIUS_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn find_song(&self, artist: &str, title: &str) -> Result<Option<SongResult>, ProviderError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let query = format!("{} {}", title, artist);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(best_hit(body.response.hits, artist))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: format!("song page {} unavailable", url),
            });
        }
        Ok(response.text().await?)
    }
}

/// Pick the song hit whose primary artist matches, else the first song hit
///
/// Song results missing an id or URL are skipped.
fn best_hit(hits: Vec<SearchHit>, artist: &str) -> Option<SongResult> {
    let wanted = artist.trim().to_lowercase();
    let songs: Vec<SongResult> = hits
        .into_iter()
        .filter(|h| h.hit_type == "song")
        .filter_map(|h| serde_json::from_value(h.result).ok())
        .collect();

    songs
        .iter()
        .find(|s| {
            s.primary_artist
                .as_ref()
                .is_some_and(|a| a.name.trim().to_lowercase() == wanted)
        })
        .or_else(|| songs.first())
        .cloned()
}

/// Extract the raw inner HTML of every lyrics container on a song page
fn lyrics_containers(html: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut rest = html;

    while let Some(marker) = rest.find(CONTAINER_MARKER) {
        let after_marker = &rest[marker..];
        let Some(open_end) = after_marker.find('>') else {
            break;
        };
        let inner = &after_marker[open_end + 1..];

        // Walk nested <div> elements to find the matching close tag
        let mut depth = 1usize;
        let mut cursor = 0usize;
        let mut end = None;
        while cursor < inner.len() {
            let next_open = inner[cursor..].find("<div");
            let next_close = inner[cursor..].find("</div>");
            match (next_open, next_close) {
                (Some(o), Some(c)) if o < c => {
                    depth += 1;
                    cursor += o + 4;
                }
                (_, Some(c)) => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(cursor + c);
                        break;
                    }
                    cursor += c + 6;
                }
                (_, None) => break,
            }
        }

        match end {
            Some(end) => {
                fragments.push(&inner[..end]);
                rest = &inner[end..];
            }
            None => {
                fragments.push(inner);
                break;
            }
        }
    }

    fragments
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Remove `[Section]` marker lines and blank lines
pub fn clean_lyrics(raw: &str) -> String {
    let without_headers = SECTION_HEADER.replace_all(raw, "");
    without_headers
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Turn a Genius song page into cleaned lyrics text
pub fn extract_lyrics(html: &str) -> Option<String> {
    let text = lyrics_containers(html)
        .into_iter()
        .map(|fragment| {
            let with_breaks = BR_TAG.replace_all(fragment, "\n");
            let stripped = ANY_TAG.replace_all(&with_breaks, "");
            decode_entities(&stripped)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let cleaned = clean_lyrics(&text);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[async_trait]
impl LyricsProvider for GeniusProvider {
    fn name(&self) -> &'static str {
        "genius"
    }

    fn confidence(&self) -> f64 {
        CONFIDENCE
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    async fn search(&self, artist: &str, title: &str) -> Result<Option<ProviderHit>, ProviderError> {
        if artist.trim().is_empty() || title.trim().is_empty() {
            return Ok(None);
        }

        let Some(song) = self.find_song(artist, title).await? else {
            info!(artist = %artist, title = %title, "Genius: no matching song");
            return Ok(None);
        };

        debug!(genius_id = song.id, url = %song.url, "Genius: fetching song page");
        let html = self.fetch_page(&song.url).await?;

        let Some(lyrics) = extract_lyrics(&html) else {
            info!(artist = %artist, title = %title, "Genius: song page has no lyrics");
            return Ok(None);
        };

        let hit = ProviderHit::new(lyrics, self.name(), CONFIDENCE)
            .with_extra("genius_id", Some(Value::from(song.id)))
            .with_extra("track_url", Some(Value::from(song.url)));
        Ok(Some(hit))
    }
}
