//! Anthropic messages API backend

use super::{check_status, http_client, retry_request, CompletionOptions, LlmBackend, LlmError, LlmResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    options: CompletionOptions,
}

impl AnthropicBackend {
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

    async fn send(&self, request: &MessagesRequest<'_>) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: MessagesResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse Anthropic response: {}", e))
        })?;

        Ok(LlmResponse::Text(body.text()))
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<LlmResponse, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            system,
            messages: vec![UserMessage { role: "user", content: user }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        debug!(model = %self.model, prompt_chars = user.len(), "Sending completion request to Anthropic");
        retry_request(self.name(), self.options.max_retries, || self.send(&request)).await
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl MessagesResponse {
    /// Concatenate all text blocks
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_blocks_are_joined() {
        let raw = r#"{"id":"msg_1","type":"message","role":"assistant","content":[
            {"type":"text","text":"{\"mood\":"},
            {"type":"text","text":"\"calm\"}"}
        ],"stop_reason":"end_turn"}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "{\"mood\":\"calm\"}");
    }

    #[test]
    fn test_system_is_top_level() {
        let request = MessagesRequest {
            model: "claude",
            system: "sys",
            messages: vec![UserMessage { role: "user", content: "hi" }],
            temperature: 0.2,
            max_tokens: 4096,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }
}
