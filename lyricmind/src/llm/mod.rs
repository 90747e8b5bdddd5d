//! LLM backend abstraction
//!
//! The analysis engine talks to one [`LlmBackend`], chosen at startup from
//! `[llm] provider`. Backends accept a system instruction plus one user
//! turn and return either a structured value or raw text.

mod anthropic;
mod ollama;
mod openai;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use lyricmind_common::config::LlmConfig;
use lyricmind_common::time;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// First retry delay; doubles per attempt
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Errors that can occur when interacting with an LLM backend
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_) | LlmError::RateLimited | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Configuration(_) | LlmError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Connection(e.to_string())
        }
    }
}

/// Completion payload
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// Backend already produced a JSON value
    Structured(Value),
    /// Free text expected to embed JSON
    Text(String),
}

/// Per-request tuning shared by all backends
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    pub max_tokens: u32,
    /// Timeout for a single HTTP request
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
}

impl From<&LlmConfig> for CompletionOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: time::secs_to_duration(config.timeout_seconds),
            max_retries: config.max_retries,
        }
    }
}

/// A chat-completion backend
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name (e.g., "openai", "ollama")
    fn name(&self) -> &str;

    /// Model being used
    fn model(&self) -> &str;

    /// Run one completion
    ///
    /// # Arguments
    /// * `system` - System instruction
    /// * `user` - The single user turn
    async fn complete(&self, system: &str, user: &str) -> Result<LlmResponse, LlmError>;
}

/// Create the backend selected by `config.provider`
///
/// Secrets must already have environment overrides applied.
///
/// # Errors
/// `LlmError::Configuration` for an unknown provider or a missing cloud key
pub fn create_backend(config: &LlmConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let provider = config.provider.trim().to_lowercase();
    let options = CompletionOptions::from(config);
    info!(provider = %provider, model = %config.model, "Initializing LLM backend");

    let backend: Arc<dyn LlmBackend> = match provider.as_str() {
        "openai" => {
            let key = config.openai_api_key.clone().ok_or_else(|| {
                LlmError::Configuration("OpenAI API key is not configured".to_string())
            })?;
            Arc::new(OpenAiBackend::new(
                &config.openai_base_url,
                &config.model,
                key,
                options,
            )?)
        }
        "anthropic" => {
            let key = config.anthropic_api_key.clone().ok_or_else(|| {
                LlmError::Configuration("Anthropic API key is not configured".to_string())
            })?;
            Arc::new(AnthropicBackend::new(
                &config.anthropic_base_url,
                &config.model,
                key,
                options,
            )?)
        }
        "ollama" => Arc::new(OllamaBackend::new(
            &config.ollama_base_url,
            &config.model,
            options,
        )?),
        other => {
            return Err(LlmError::Configuration(format!(
                "Unsupported LLM provider: {}",
                other
            )))
        }
    };

    Ok(backend)
}

/// Build a reqwest client with the per-request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Map a non-success HTTP status to an error
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(LlmError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

/// Retry an LLM request with exponential backoff
///
/// Retryable failures (see [`LlmError::is_retryable`]) are attempted again
/// up to `max_retries` times; other failures return immediately.
pub async fn with_retries<F, Fut, T>(
    backend: &str,
    max_retries: u32,
    initial_backoff: Duration,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0u32;
    let mut backoff = initial_backoff;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!(
                    backend,
                    attempt,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "LLM request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Retry with the default backoff schedule
pub(crate) async fn retry_request<F, Fut, T>(
    backend: &str,
    max_retries: u32,
    operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    with_retries(backend, max_retries, INITIAL_BACKOFF, operation).await
}

// ============================================================================
// Mock Backend for Testing
// ============================================================================
