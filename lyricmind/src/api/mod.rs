//! HTTP API handlers for lyricmind
//!
//! Success bodies are `{"status": "success", "data": ...}`. A lyrics
//! search that finds nothing answers 404 with `{"status": "not_found"}`.

pub mod analyzer;
pub mod cache;
pub mod discovery;
pub mod health;

pub use analyzer::analyzer_routes;
pub use cache::cache_routes;
pub use discovery::discovery_routes;
pub use health::health_routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub status: &'static str,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        data,
    })
}

/// 404 for a search that exhausted every provider
pub fn not_found(message: impl Into<String>) -> Response {
    let body = Json(json!({
        "status": "not_found",
        "message": message.into(),
    }));
    (StatusCode::NOT_FOUND, body).into_response()
}
