use crate::core::config::Config;
use crate::core::error::GenerationError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Text,
    /// Sends `response_format: {"type": "json_object"}`.
    JsonObject,
}

#[cfg(target_arch = "wasm32")]
pub trait LlmBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> LlmBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait LlmBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> LlmBounds for T {}

/// One chat completion, exactly one network call, no retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LlmClient: LlmBounds + Debug {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        mode: ResponseMode,
    ) -> Result<String, GenerationError>;
}

pub fn create_llm(config: &Config) -> Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "perplexity" | "openai" => Ok(Box::new(ChatCompletionsClient::new(
            config.llm.resolved_api_key(),
            &config.llm.model,
            &config.llm.resolved_base_url(),
        ))),
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

// --- OpenAI-compatible chat completions (Perplexity, OpenAI) ---

#[derive(Debug)]
pub struct ChatCompletionsClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    pub fn new(api_key: Option<String>, model: &str, base_url: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// `error.message` from the body, else the status reason phrase.
fn provider_error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Erreur inconnue").to_string())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl LlmClient for ChatCompletionsClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        mode: ResponseMode,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(GenerationError::missing_credentials)?;

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            response_format: match mode {
                ResponseMode::JsonObject => Some(ResponseFormat { kind: "json_object" }),
                ResponseMode::Text => None,
            },
        };

        log::debug!(
            "POST {} model={} messages={} mode={:?}",
            url,
            self.model,
            messages.len(),
            mode
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            log::debug!("Provider error body: {}", body);
            let message = provider_error_message(&body, status);
            log::warn!("Provider returned {}: {}", status.as_u16(), message);
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let result: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            log::debug!("Unparseable completion body: {}", body);
            GenerationError::MalformedResponse(e.to_string())
        })?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::MalformedResponse("réponse vide".to_string()))
    }
}
