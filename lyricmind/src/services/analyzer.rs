//! Lyrics analysis engine
//!
//! Resolves a framework, consults the analysis cache, and on a miss fills
//! the prompt, calls the LLM backend, parses its JSON answer and writes the
//! result through to the cache.
//!
//! # Failure exits
//! - Prompt build: unknown framework or empty registry → `Configuration`
//! - LLM call: transport or provider fault → `Runtime`
//! - Parse: empty, non-JSON or wrongly shaped answer → `Format`

use crate::db::{AnalysisCacheStore, AnalysisKey};
use crate::llm::{LlmBackend, LlmResponse};
use crate::services::frameworks::FrameworkRegistry;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Token replaced by the lyrics in a framework prompt
pub const LYRICS_PLACEHOLDER: &str = "[PASTE LYRICS HERE]";

pub const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in analyzing song lyrics. \
     Provide your analysis in JSON format.";

const EXCERPT_CHARS: usize = 200;

/// Analysis failures
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unknown framework or empty registry
    #[error("{message}")]
    Configuration {
        framework: Option<String>,
        message: String,
    },

    /// LLM answer was empty, not JSON, or of an unexpected shape
    #[error("Invalid response from LLM for framework '{framework}': {message} (response: {excerpt:?})")]
    Format {
        framework: String,
        message: String,
        excerpt: String,
    },

    /// LLM unavailable (including a backend rejected at startup for
    /// missing credentials) or the request failed
    #[error("{message}")]
    Runtime {
        framework: Option<String>,
        message: String,
    },

    /// Blank artist, title, or lyrics
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Analysis cache could not be read or written
    #[error("Analysis cache error: {0}")]
    Store(lyricmind_common::Error),
}

impl From<lyricmind_common::Error> for AnalysisError {
    fn from(err: lyricmind_common::Error) -> Self {
        match err {
            lyricmind_common::Error::InvalidInput(message) => AnalysisError::InvalidInput(message),
            other => AnalysisError::Store(other),
        }
    }
}

impl AnalysisError {
    /// Failures caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::Configuration { .. }
                | AnalysisError::Format { .. }
                | AnalysisError::InvalidInput(_)
        )
    }

    pub fn framework(&self) -> Option<&str> {
        match self {
            AnalysisError::Configuration { framework, .. }
            | AnalysisError::Runtime { framework, .. } => framework.as_deref(),
            AnalysisError::Format { framework, .. } => Some(framework),
            AnalysisError::InvalidInput(_) | AnalysisError::Store(_) => None,
        }
    }
}

/// Truncate text for error messages on a char boundary
fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Substitute the lyrics into a prompt template
///
/// Without a placeholder the lyrics are appended after the template.
pub fn fill_prompt(framework: &str, template: &str, lyrics: &str) -> String {
    if template.contains(LYRICS_PLACEHOLDER) {
        template.replace(LYRICS_PLACEHOLDER, lyrics)
    } else {
        warn!(
            framework = %framework,
            "Placeholder '{}' not found in framework, appending lyrics to the prompt",
            LYRICS_PLACEHOLDER
        );
        format!("{}\n\nLyrics to analyze:\n{}", template, lyrics)
    }
}

/// Turn an LLM response into a JSON object or array
///
/// Text answers are searched for the first `{` and last `}` so JSON
/// wrapped in prose still parses.
pub fn parse_llm_response(framework: &str, response: LlmResponse) -> Result<Value, AnalysisError> {
    let format_error = |message: &str, raw: &str| AnalysisError::Format {
        framework: framework.to_string(),
        message: message.to_string(),
        excerpt: excerpt(raw),
    };

    match response {
        LlmResponse::Structured(value) => {
            let is_empty = match &value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            if is_empty {
                return Err(format_error("LLM returned an empty response", &value.to_string()));
            }
            if value.is_object() || value.is_array() {
                Ok(value)
            } else {
                Err(format_error(
                    "LLM returned an unexpected response shape",
                    &value.to_string(),
                ))
            }
        }
        LlmResponse::Text(text) => {
            if text.trim().is_empty() {
                return Err(format_error("LLM returned an empty response", &text));
            }

            let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
                return Err(format_error("no JSON object found in response", &text));
            };
            if end < start {
                return Err(format_error("no JSON object found in response", &text));
            }

            serde_json::from_str(&text[start..=end])
                .map_err(|e| format_error(&format!("response is not valid JSON: {}", e), &text))
        }
    }
}

/// Framework-versioned, cached LLM analysis
pub struct AnalysisEngine {
    llm: Option<Arc<dyn LlmBackend>>,
    frameworks: Arc<FrameworkRegistry>,
    cache: AnalysisCacheStore,
    default_framework: String,
    /// Why `llm` is `None`, reported in analysis errors
    llm_unavailable_reason: Option<String>,
}

impl AnalysisEngine {
    /// # Arguments
    /// * `llm` - `None` when no backend could be created; every analysis then fails
    pub fn new(
        llm: Option<Arc<dyn LlmBackend>>,
        frameworks: Arc<FrameworkRegistry>,
        cache: AnalysisCacheStore,
        default_framework: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            frameworks,
            cache,
            default_framework: default_framework.into(),
            llm_unavailable_reason: None,
        }
    }

    /// Record why no LLM backend could be created
    pub fn with_llm_unavailable_reason(mut self, reason: impl Into<String>) -> Self {
        self.llm_unavailable_reason = Some(reason.into());
        self
    }

    pub fn llm_available(&self) -> bool {
        self.llm.is_some()
    }

    pub fn llm(&self) -> Option<&Arc<dyn LlmBackend>> {
        self.llm.as_ref()
    }

    pub fn frameworks(&self) -> &FrameworkRegistry {
        &self.frameworks
    }

    pub fn default_framework(&self) -> &str {
        &self.default_framework
    }

    /// Analyze lyrics with a framework
    ///
    /// # Arguments
    /// * `framework_name` - `None` uses the configured default
    ///
    /// # Returns
    /// The structured analysis, from cache when the same normalized lyrics
    /// were analyzed before with the same framework name and version
    pub async fn analyze_lyrics(
        &self,
        lyrics: &str,
        framework_name: Option<&str>,
    ) -> Result<Value, AnalysisError> {
        let name = match framework_name {
            Some(name) => name,
            None => {
                debug!(framework = %self.default_framework, "No framework specified, using default");
                self.default_framework.as_str()
            }
        };

        let Some(llm) = &self.llm else {
            error!(framework = %name, "LLM not initialized, cannot perform analysis");
            return Err(AnalysisError::Runtime {
                framework: Some(name.to_string()),
                message: format!(
                    "LLM is not available for analysis with framework '{}'{}",
                    name,
                    self.llm_unavailable_reason
                        .as_deref()
                        .map(|reason| format!(": {}", reason))
                        .unwrap_or_default()
                ),
            });
        };

        if self.frameworks.is_empty() {
            return Err(AnalysisError::Configuration {
                framework: Some(name.to_string()),
                message: format!(
                    "No analysis frameworks are loaded, cannot use framework '{}'",
                    name
                ),
            });
        }

        let Some(framework) = self.frameworks.get(name) else {
            return Err(AnalysisError::Configuration {
                framework: Some(name.to_string()),
                message: format!(
                    "Framework not found: {}. Available: {}",
                    name,
                    self.frameworks.names().join(", ")
                ),
            });
        };

        let key = AnalysisKey::new(lyrics, &framework.name, &framework.version);
        if let Some(cached) = self.cache.get(&key).await? {
            info!(
                framework = %framework.name,
                version = %framework.version,
                "Found cached analysis result"
            );
            return Ok(cached);
        }

        info!(
            framework = %framework.name,
            version = %framework.version,
            backend = llm.name(),
            model = llm.model(),
            "Running analysis"
        );

        let prompt = fill_prompt(&framework.name, &framework.prompt, lyrics);
        let response = llm
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| {
                error!(framework = %framework.name, error = %e, "LLM request failed");
                AnalysisError::Runtime {
                    framework: Some(framework.name.clone()),
                    message: format!("Analysis failed for framework '{}': {}", framework.name, e),
                }
            })?;

        let result = parse_llm_response(&framework.name, response).map_err(|e| {
            error!(framework = %framework.name, error = %e, "Failed to parse LLM response");
            e
        })?;

        self.cache.put(&key, &result).await?;
        info!(
            framework = %framework.name,
            version = %framework.version,
            "Analysis complete and cached"
        );
        Ok(result)
    }
}
