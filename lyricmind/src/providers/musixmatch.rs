//! Musixmatch lyrics provider
//!
//! Two requests per lookup: `track.search` for the best-rated match, then
//! `track.lyrics.get` by commontrack id (or track id as a fallback). The
//! free tier truncates lyrics and appends a `*******` disclaimer, which is
//! cut off here.

use crate::types::{LyricsProvider, ProviderError, ProviderHit};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const MUSIXMATCH_BASE_URL: &str = "https://api.musixmatch.com/ws/1.1";
const CONFIDENCE: f64 = 0.8;
const DISCLAIMER_MARKER: &str = "*******";
/// Bodies shorter than this that carry the disclaimer are placeholders
const RESTRICTED_BODY_CHARS: usize = 200;
const MIN_BODY_CHARS: usize = 20;

/// Musixmatch envelope: every response is wrapped in `message`
#[derive(Debug, Deserialize)]
struct Envelope {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    header: Header,
    /// Musixmatch sends `[]` instead of an object on some errors
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Header {
    status_code: u16,
}

#[derive(Debug, Deserialize)]
struct TrackSearchBody {
    #[serde(default)]
    track_list: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    track: Track,
}

#[derive(Debug, Clone, Deserialize)]
struct Track {
    track_id: Option<u64>,
    commontrack_id: Option<u64>,
    track_share_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LyricsBody {
    lyrics: Lyrics,
}

#[derive(Debug, Deserialize)]
struct Lyrics {
    #[serde(default)]
    lyrics_body: String,
    lyrics_copyright: Option<String>,
}

impl Message {
    /// Decode the body, treating a missing or non-object body as absent
    fn decode_body<B: DeserializeOwned>(self) -> Option<B> {
        self.body
            .filter(Value::is_object)
            .and_then(|b| serde_json::from_value(b).ok())
    }
}

/// Musixmatch API client
pub struct MusixmatchProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl MusixmatchProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: MUSIXMATCH_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, method: &str, params: &[(&str, String)]) -> Result<Message, ProviderError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), method);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("apikey", self.api_key.as_str())])
            .query(params)
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

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(envelope.message)
    }

    async fn search_track(&self, artist: &str, title: &str) -> Result<Option<Track>, ProviderError> {
        let message = self
            .get(
                "track.search",
                &[
                    ("q_artist", artist.to_string()),
                    ("q_track", title.to_string()),
                    ("s_track_rating", "desc".to_string()),
                ],
            )
            .await?;

        if message.header.status_code != 200 {
            debug!(status = message.header.status_code, "Musixmatch track.search returned non-OK header");
            return Ok(None);
        }

        Ok(message
            .decode_body::<TrackSearchBody>()
            .and_then(|body| body.track_list.into_iter().next())
            .map(|entry| entry.track))
    }
}

/// Strip the free-tier disclaimer
///
/// Returns `None` for placeholder bodies and for bodies that are too short
/// once the disclaimer is removed.
pub fn clean_lyrics_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.contains(DISCLAIMER_MARKER) && body.chars().count() < RESTRICTED_BODY_CHARS {
        return None;
    }

    let cleaned = body
        .split(DISCLAIMER_MARKER)
        .next()
        .unwrap_or_default()
        .trim();

    if cleaned.chars().count() > MIN_BODY_CHARS {
        Some(cleaned.to_string())
    } else {
        None
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchProvider {
    fn name(&self) -> &'static str {
        "musixmatch"
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

        let Some(track) = self.search_track(artist, title).await? else {
            info!(artist = %artist, title = %title, "Musixmatch: track not found");
            return Ok(None);
        };

        let id_param = match (track.commontrack_id, track.track_id) {
            (Some(id), _) => ("commontrack_id", id.to_string()),
            (None, Some(id)) => ("track_id", id.to_string()),
            (None, None) => {
                info!(artist = %artist, title = %title, "Musixmatch: match has no track id");
                return Ok(None);
            }
        };

        let message = self.get("track.lyrics.get", &[id_param]).await?;
        let status_code = message.header.status_code;
        if status_code != 200 {
            return Err(ProviderError::Api {
                status: status_code,
                message: "track.lyrics.get returned non-OK header".to_string(),
            });
        }

        let Some(body) = message.decode_body::<LyricsBody>() else {
            return Err(ProviderError::Parse("track.lyrics.get body missing lyrics".to_string()));
        };

        let Some(lyrics) = clean_lyrics_body(&body.lyrics.lyrics_body) else {
            info!(artist = %artist, title = %title, "Musixmatch: lyrics restricted or too short");
            return Ok(None);
        };

        let hit = ProviderHit::new(lyrics, self.name(), CONFIDENCE)
            .with_extra("musixmatch_id", track.track_id.map(Value::from))
            .with_extra(
                "copyright_info",
                body.lyrics.lyrics_copyright.map(Value::from),
            )
            .with_extra("track_url", track.track_share_url.map(Value::from));
        Ok(Some(hit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::stub;
    use axum::extract::{Query, State};
    use axum::http::StatusCode as HttpStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_disclaimer_is_cut() {
        let verse = "Walking down the empty road tonight\n".repeat(8);
        let body = format!(
            "{}...\n\n******* This Lyrics is NOT for Commercial use *******\n(1409623456789)",
            verse
        );
        let cleaned = clean_lyrics_body(&body).unwrap();
        assert!(!cleaned.contains("*******"));
        assert!(cleaned.starts_with("Walking down"));
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_short_restricted_body_is_rejected() {
        let body = "******* This Lyrics is NOT for Commercial use *******";
        assert_eq!(clean_lyrics_body(body), None);
    }

    #[test]
    fn test_tiny_body_is_rejected() {
        assert_eq!(clean_lyrics_body("la la la"), None);
    }

    #[test]
    fn test_plain_body_is_trimmed() {
        let body = "  Just a normal set of lyrics with no disclaimer  ";
        assert_eq!(
            clean_lyrics_body(body).as_deref(),
            Some("Just a normal set of lyrics with no disclaimer")
        );
    }

    #[test]
    fn test_track_search_payload_decodes() {
        let raw = r#"{"message":{"header":{"status_code":200},"body":{"track_list":[
            {"track":{"track_id":15445219,"commontrack_id":5920049,"track_share_url":"https://www.musixmatch.com/lyrics/x"}}
        ]}}}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        let mut body: TrackSearchBody = envelope.message.decode_body().unwrap();
        let track = body.track_list.remove(0).track;
        assert_eq!(track.commontrack_id, Some(5920049));
        assert_eq!(track.track_id, Some(15445219));
    }

    #[test]
    fn test_array_body_is_absent() {
        let raw = r#"{"message":{"header":{"status_code":401},"body":[]}}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.message.header.status_code, 401);
        assert!(envelope.message.decode_body::<TrackSearchBody>().is_none());
    }

    #[derive(Default)]
    struct Calls {
        search: AtomicUsize,
        lyrics: AtomicUsize,
    }

    async fn track_search(
        State(calls): State<Arc<Calls>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        calls.search.fetch_add(1, Ordering::SeqCst);
        if params.get("apikey").map(String::as_str) != Some("test-key") {
            return Json(json!({"message": {"header": {"status_code": 401}, "body": []}})).into_response();
        }
        match params.get("q_artist").map(String::as_str) {
            Some("Broken") => (HttpStatus::SERVICE_UNAVAILABLE, "maintenance").into_response(),
            Some("Nobody") => Json(json!({
                "message": {"header": {"status_code": 200}, "body": {"track_list": []}}
            }))
            .into_response(),
            _ => Json(json!({
                "message": {"header": {"status_code": 200}, "body": {"track_list": [
                    {"track": {
                        "track_id": 15445219,
                        "commontrack_id": 5920049,
                        "track_share_url": "https://www.musixmatch.com/lyrics/Queen/Bohemian-Rhapsody"
                    }}
                ]}}
            }))
            .into_response(),
        }
    }

    async fn track_lyrics(
        State(calls): State<Arc<Calls>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        calls.lyrics.fetch_add(1, Ordering::SeqCst);
        if params.get("commontrack_id").map(String::as_str) != Some("5920049") {
            return Json(json!({"message": {"header": {"status_code": 404}, "body": []}})).into_response();
        }
        let body = format!(
            "{}...\n\n******* This Lyrics is NOT for Commercial use *******",
            "Is this the real life? Is this just fantasy?\n".repeat(5)
        );
        Json(json!({
            "message": {"header": {"status_code": 200}, "body": {"lyrics": {
                "lyrics_body": body,
                "lyrics_copyright": "Lyrics powered by www.musixmatch.com"
            }}}
        }))
        .into_response()
    }

    async fn stub_provider(api_key: &str) -> (MusixmatchProvider, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let router = Router::new()
            .route("/ws/track.search", get(track_search))
            .route("/ws/track.lyrics.get", get(track_lyrics))
            .with_state(calls.clone());
        let base_url = stub::serve(router).await;
        let provider = MusixmatchProvider::new(stub::client(), api_key.to_string())
            .with_base_url(format!("{}/ws", base_url));
        (provider, calls)
    }

    #[tokio::test]
    async fn test_search_then_lyrics_get() {
        let (provider, calls) = stub_provider("test-key").await;

        let hit = provider
            .search("Queen", "Bohemian Rhapsody")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.source, "musixmatch");
        assert!(hit.lyrics.starts_with("Is this the real life?"));
        assert!(!hit.lyrics.contains("*******"));
        let record = hit.into_record("Queen", "Bohemian Rhapsody");
        assert_eq!(record.metadata["musixmatch_id"], json!(15445219));
        assert_eq!(
            record.metadata["copyright_info"],
            json!("Lyrics powered by www.musixmatch.com")
        );
        assert_eq!(calls.search.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lyrics.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_track_list_is_not_found() {
        let (provider, calls) = stub_provider("test-key").await;

        assert!(provider.search("Nobody", "Nothing").await.unwrap().is_none());
        assert_eq!(calls.lyrics.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_found() {
        let (provider, calls) = stub_provider("wrong-key").await;

        assert!(provider.search("Queen", "Bohemian Rhapsody").await.unwrap().is_none());
        assert_eq!(calls.lyrics.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let (provider, _calls) = stub_provider("test-key").await;

        let err = provider.search("Broken", "Song").await.unwrap_err();

        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }
}
