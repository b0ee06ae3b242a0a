use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationClient, LlmSettings};

/// Keep the model loaded between consecutive report requests.
const KEEP_ALIVE: &str = "5m";

/// Low temperature keeps the report wording consistent across runs.
const TEMPERATURE: f32 = 0.2;

/// Adapter for an Ollama-hosted model via the `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let url = format!("{}/api/chat", settings.endpoint.trim_end_matches('/'));
        let http = Client::builder()
            .user_agent("denticheck/0.3")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build Ollama HTTP client")?;
        Ok(Self {
            http,
            url,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt.to_string(),
                },
            ],
            stream: false,
            keep_alive: KEEP_ALIVE,
            options: ChatOptions {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("failed to call Ollama chat API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama API error ({}): {}", status, body);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("failed to parse Ollama response")?;
        if chat.message.content.trim().is_empty() {
            bail!("Ollama response contained no message content");
        }
        Ok(chat.message.content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    keep_alive: &'static str,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings_for(server: &MockServer) -> LlmSettings {
        LlmSettings {
            provider: "ollama".to_string(),
            endpoint: server.base_url(),
            model: "llama3.1:latest".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .json_body_partial(r#"{"model": "llama3.1:latest", "stream": false}"#);
                then.status(200).json_body(json!({
                    "model": "llama3.1:latest",
                    "message": {"role": "assistant", "content": "SUMMARY: ok"},
                    "done": true
                }));
            })
            .await;

        let client = OllamaClient::new(&settings_for(&server)).unwrap();
        let text = client.complete("persona", "context").await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, "SUMMARY: ok");
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500).body("model not found");
            })
            .await;

        let client = OllamaClient::new(&settings_for(&server)).unwrap();
        let err = client.complete("persona", "context").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({
                    "message": {"role": "assistant", "content": "  "},
                    "done": true
                }));
            })
            .await;

        let client = OllamaClient::new(&settings_for(&server)).unwrap();
        let err = client.complete("persona", "context").await.unwrap_err();
        assert!(err.to_string().contains("no message content"));
    }
}
