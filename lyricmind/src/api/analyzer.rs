//! Analysis endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{not_found, success};
use crate::services::{self, FrameworkInfo};
use crate::{ApiError, ApiResult, AppState};

/// POST /api/analyzer/analyze request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub lyrics: String,
    pub framework: Option<String>,
}

/// POST /api/analyzer/analyze-song request
#[derive(Debug, Deserialize)]
pub struct AnalyzeSongRequest {
    pub artist: String,
    pub title: String,
    pub framework: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

/// GET /api/analyzer/frameworks response
#[derive(Debug, Serialize)]
pub struct FrameworkList {
    pub default: String,
    pub frameworks: Vec<FrameworkInfo>,
}

fn require_llm(state: &AppState) -> ApiResult<()> {
    if state.analyzer.llm_available() {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "LLM backend is not configured".to_string(),
        ))
    }
}

/// POST /api/analyzer/analyze
pub async fn analyze_lyrics(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Response> {
    if request.lyrics.trim().is_empty() {
        return Err(ApiError::BadRequest("lyrics are required".to_string()));
    }
    require_llm(&state)?;

    let analysis = state
        .analyzer
        .analyze_lyrics(&request.lyrics, request.framework.as_deref())
        .await?;

    let framework = request
        .framework
        .unwrap_or_else(|| state.analyzer.default_framework().to_string());
    Ok(success(json!({
        "framework": framework,
        "analysis": analysis,
    }))
    .into_response())
}

/// POST /api/analyzer/analyze-song
///
/// Rejects a request for a song that is already being analyzed with 409.
pub async fn analyze_song(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeSongRequest>,
) -> ApiResult<Response> {
    if request.artist.trim().is_empty() || request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("artist and title are required".to_string()));
    }
    require_llm(&state)?;

    let Some(_guard) = state
        .active_songs
        .try_acquire(&request.artist, &request.title)
    else {
        return Err(ApiError::Conflict(format!(
            "Analysis already in progress for '{} - {}'",
            request.artist, request.title
        )));
    };

    info!(
        artist = %request.artist,
        title = %request.title,
        framework = ?request.framework,
        "Song analysis requested"
    );

    let result = services::analyze_song(
        &state.discovery,
        &state.analyzer,
        &request.artist,
        &request.title,
        request.framework.as_deref(),
        request.force_refresh,
    )
    .await?;

    match result {
        Some(song) => Ok(success(song).into_response()),
        None => Ok(not_found(format!(
            "No lyrics found for '{} - {}'",
            request.artist, request.title
        ))),
    }
}

/// GET /api/analyzer/frameworks
pub async fn list_frameworks(State(state): State<AppState>) -> impl IntoResponse {
    success(FrameworkList {
        default: state.analyzer.default_framework().to_string(),
        frameworks: state.analyzer.frameworks().list(),
    })
}

/// GET /api/analyzer/frameworks/:name
pub async fn get_framework(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let registry = state.analyzer.frameworks();
    let framework = registry
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Framework not found: {}", name)))?;

    let source = registry
        .source(&name)
        .transpose()
        .map_err(|e| ApiError::Internal(format!("Failed to read framework '{}': {}", name, e)))?
        .unwrap_or_else(|| framework.prompt.clone());

    Ok(success(json!({
        "name": framework.name,
        "version": framework.version,
        "source": source,
    })))
}

pub fn analyzer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyzer/analyze", post(analyze_lyrics))
        .route("/api/analyzer/analyze-song", post(analyze_song))
        .route("/api/analyzer/frameworks", get(list_frameworks))
        .route("/api/analyzer/frameworks/:name", get(get_framework))
}
