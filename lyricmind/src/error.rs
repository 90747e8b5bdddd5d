//! HTTP error type for the lyricmind API

use crate::services::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., same song already being analyzed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Service unavailable (503) - e.g., no LLM backend
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// lyricmind-common error
    #[error("Common error: {0}")]
    Common(#[from] lyricmind_common::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Store(inner) => ApiError::Common(inner),
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(lyricmind_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "status": "error",
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_mapping() {
        let config = AnalysisError::Configuration {
            framework: Some("x".into()),
            message: "Framework not found: x".into(),
        };
        assert!(matches!(ApiError::from(config), ApiError::BadRequest(_)));

        let format = AnalysisError::Format {
            framework: "x".into(),
            message: "bad".into(),
            excerpt: "oops".into(),
        };
        assert!(matches!(ApiError::from(format), ApiError::BadRequest(_)));

        let runtime = AnalysisError::Runtime {
            framework: None,
            message: "down".into(),
        };
        assert!(matches!(ApiError::from(runtime), ApiError::Internal(_)));

        let invalid = AnalysisError::from(lyricmind_common::Error::InvalidInput("blank".into()));
        assert!(matches!(ApiError::from(invalid), ApiError::BadRequest(_)));

        let store = AnalysisError::from(lyricmind_common::Error::Internal("disk".into()));
        assert!(matches!(ApiError::from(store), ApiError::Common(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Conflict("busy".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Common(lyricmind_common::Error::InvalidInput("blank".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
