//! Anthropic Messages API client for answer generation with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::prompt::PromptBuilder;

const API_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic API client with automatic retry
pub struct AnthropicClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// API key from the environment
    api_key: String,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    /// Create a new client; requires `ANTHROPIC_API_KEY` in the environment
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            Error::Config(format!(
                "Missing Anthropic API key. Set the {} environment variable.",
                API_KEY_ENV
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            api_key,
            config: config.clone(),
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Llm("Unknown error".to_string())))
    }

    /// Generate a completion for a fully-built prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let model = self.config.model.clone();
        let temperature = self.config.temperature;
        let max_tokens = self.config.max_tokens;
        let prompt = prompt.to_string();
        let client = self.client.clone();
        let api_key = self.api_key.clone();

        self.retry_request(|| {
            let url = url.clone();
            let model = model.clone();
            let prompt = prompt.clone();
            let client = client.clone();
            let api_key = api_key.clone();

            async move {
                let request = MessagesRequest {
                    model,
                    max_tokens,
                    temperature,
                    messages: vec![Message {
                        role: "user",
                        content: prompt,
                    }],
                };

                let response = client
                    .post(&url)
                    .header("x-api-key", &api_key)
                    .header("anthropic-version", API_VERSION)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let messages_response: MessagesResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::Llm(format!("Failed to parse response: {}", e)))?;

                let text: String = messages_response
                    .content
                    .iter()
                    .filter(|block| block.kind == "text")
                    .map(|block| block.text.as_str())
                    .collect();

                if text.is_empty() {
                    return Err(Error::Llm("Model returned an empty answer".to_string()));
                }

                Ok(text)
            }
        })
        .await
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.config.model);
        let prompt = PromptBuilder::build_qa_prompt(question, context);
        self.generate(&prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        // There is no unauthenticated ping endpoint; reaching the host is
        // enough to tell connectivity problems from key problems.
        match self.client.head(&self.config.base_url).send().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_serializes_api_shape() {
        let request = MessagesRequest {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            messages: vec![Message {
                role: "user",
                content: "hello".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-haiku-20240307");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn response_text_blocks_are_concatenated() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "part one "},
                {"type": "tool_use"},
                {"type": "text", "text": "part two"}
            ]
        }"#;

        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text: String = response
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(text, "part one part two");
    }
}
