use crate::core::config::LlmConfig;
use crate::core::error::GenerationError;
use crate::services::llm::{ChatMessage, LlmClient, ResponseMode};
use crate::services::prompt::StructuredRequest;
use crate::services::script::parse_payload;
use serde_json::Value;

/// Summary and script calls on top of a chat client.
#[derive(Debug)]
pub struct Generator {
    llm: Box<dyn LlmClient>,
    summary_temperature: f32,
    script_temperature: f32,
}

impl Generator {
    pub fn new(llm: Box<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            llm,
            summary_temperature: config.summary_temperature,
            script_temperature: config.script_temperature,
        }
    }

    pub async fn generate_summary(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let text = self
            .llm
            .chat(messages, self.summary_temperature, ResponseMode::Text)
            .await?;
        let summary = text.trim();
        if summary.is_empty() {
            return Err(GenerationError::MalformedResponse("résumé vide".to_string()));
        }
        Ok(summary.to_string())
    }

    /// Parsed JSON payload; shape checks belong to the assembler.
    pub async fn generate_script(&self, request: &StructuredRequest) -> Result<Value, GenerationError> {
        log::info!(
            "Requesting {} chapter(s) starting at chapter {}",
            request.chapters_requested,
            request.chapter_offset + 1
        );
        let text = self
            .llm
            .chat(&request.messages, self.script_temperature, ResponseMode::JsonObject)
            .await?;
        parse_payload(&text)
    }
}
