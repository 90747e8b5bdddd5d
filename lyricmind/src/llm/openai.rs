//! OpenAI chat completions backend

use super::{check_status, http_client, retry_request, CompletionOptions, LlmBackend, LlmError, LlmResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    options: CompletionOptions,
}

impl OpenAiBackend {
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.openai.com/v1")
    /// * `model` - Model to use (e.g., "gpt-4")
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: String,
        options: CompletionOptions,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(options.timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            options,
        })
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: ChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse::Text(choice.message.content.unwrap_or_default()))
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<LlmResponse, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        debug!(model = %self.model, prompt_chars = user.len(), "Sending completion request to OpenAI");
        retry_request(self.name(), self.options.max_retries, || self.send(&request)).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
