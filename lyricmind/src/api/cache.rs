//! Cache maintenance endpoint

use axum::{body::Bytes, extract::State, response::IntoResponse, routing::post, Router};
use serde::Deserialize;

use super::success;
use crate::db::clear_old_cache;
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct ClearCacheRequest {
    pub days: Option<u32>,
}

impl ClearCacheRequest {
    /// Parse an optional JSON body; an empty body means defaults
    ///
    /// # Errors
    /// `ApiError::BadRequest` for malformed JSON or a `days` value that is
    /// not a positive integer
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| {
            ApiError::BadRequest(format!("days must be a positive integer: {}", e))
        })
    }

    /// Retention in days, validated to be at least 1
    pub fn retention_days(&self) -> ApiResult<u32> {
        match self.days {
            None => Ok(DEFAULT_RETENTION_DAYS),
            Some(0) => Err(ApiError::BadRequest(
                "days must be a positive integer".to_string(),
            )),
            Some(days) => Ok(days),
        }
    }
}

/// POST /api/cache/clear
///
/// Body is optional; `days` defaults to 30 and must be at least 1.
pub async fn clear_cache(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let days = ClearCacheRequest::from_body(&body)?.retention_days()?;

    let counts = clear_old_cache(&state.db, days).await?;
    Ok(success(counts))
}

pub fn cache_routes() -> Router<AppState> {
    Router::new().route("/api/cache/clear", post(clear_cache))
}
