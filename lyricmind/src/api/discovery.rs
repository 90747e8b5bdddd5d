//! Lyrics discovery endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{not_found, success};
use crate::{ApiError, ApiResult, AppState};

/// POST /api/discovery/search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub force_refresh: bool,
}

/// POST /api/discovery/search
pub async fn search_lyrics(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Response> {
    if request.artist.trim().is_empty() || request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("artist and title are required".to_string()));
    }

    info!(
        artist = %request.artist,
        title = %request.title,
        force_refresh = request.force_refresh,
        "Lyrics search requested"
    );

    match state
        .discovery
        .search_lyrics(&request.artist, &request.title, request.force_refresh)
        .await?
    {
        Some(record) => Ok(success(record).into_response()),
        None => Ok(not_found(format!(
            "No lyrics found for '{} - {}'",
            request.artist, request.title
        ))),
    }
}

/// GET /api/discovery/providers
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    success(state.discovery.providers())
}

pub fn discovery_routes() -> Router<AppState> {
    Router::new()
        .route("/api/discovery/search", post(search_lyrics))
        .route("/api/discovery/providers", get(list_providers))
}
