//! Ollama local inference backend
//!
//! Uses the `/api/chat` endpoint with streaming disabled. No API key.

use super::{check_status, http_client, retry_request, CompletionOptions, LlmBackend, LlmError, LlmResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    options: CompletionOptions,
}

impl OllamaBackend {
    /// # Arguments
    /// * `base_url` - Ollama server URL (e.g., "http://localhost:11434")
    pub fn new(base_url: &str, model: &str, options: CompletionOptions) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(options.timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
        })
    }

    async fn send(&self, request: &OllamaChatRequest<'_>) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let response = check_status(response).await?;

        let body: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(LlmResponse::Text(body.message.content))
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<LlmResponse, LlmError> {
        let request = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage { role: "system", content: system },
                OllamaMessage { role: "user", content: user },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        };

        debug!(model = %self.model, prompt_chars = user.len(), "Sending chat request to Ollama");
        retry_request(self.name(), self.options.max_retries, || self.send(&request)).await
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}
