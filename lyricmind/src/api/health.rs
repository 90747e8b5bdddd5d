//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Module name ("lyricmind")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Build identifier (git hash, profile, build time)
    pub build: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Number of active lyrics providers
    pub providers: usize,
    /// Number of loaded frameworks
    pub frameworks: usize,
    pub llm_available: bool,
    /// Startup problems, if any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// GET /api/health
///
/// Returns 503 when the LLM backend is missing.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let llm_available = state.analyzer.llm_available();
    let (status_code, status) = if llm_available {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status: status.to_string(),
        module: "lyricmind".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: env!("LYRICMIND_BUILD_ID").to_string(),
        uptime_seconds,
        providers: state.discovery.provider_count(),
        frameworks: state.analyzer.frameworks().len(),
        llm_available,
        issues: state.issues.as_ref().clone(),
    };

    (status_code, Json(response))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}
