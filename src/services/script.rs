use crate::core::error::GenerationError;
use crate::core::state::{Chapter, Script};
use serde::Deserialize;
use serde_json::Value;

/// Removes a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    let s = if let Some(rest) = s.strip_prefix("```json") {
        rest
    } else if let Some(rest) = s.strip_prefix("```JSON") {
        rest
    } else {
        s.strip_prefix("```").unwrap_or(s)
    };
    s.trim_end().trim_end_matches("```").trim().to_string()
}

/// Parses provider text into JSON, tolerating a markdown fence.
pub fn parse_payload(response: &str) -> Result<Value, GenerationError> {
    let clean = strip_code_blocks(response);
    serde_json::from_str(&clean).map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}

/// A fresh script from a full-generation payload.
pub fn assemble_full(payload: &Value) -> Result<Script, GenerationError> {
    let title = payload
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::Validation("champ \"title\" manquant".to_string()))?;
    let chapters = parse_chapters(payload)?;
    Ok(Script {
        title: title.to_string(),
        chapters,
    })
}

/// `prior` unchanged, followed by the payload's chapters in the order returned.
pub fn assemble_incremental(prior: &Script, payload: &Value) -> Result<Script, GenerationError> {
    let new_chapters = parse_chapters(payload)?;
    let mut chapters = Vec::with_capacity(prior.chapters.len() + new_chapters.len());
    chapters.extend_from_slice(&prior.chapters);
    chapters.extend(new_chapters);
    Ok(Script {
        title: prior.title.clone(),
        chapters,
    })
}

fn parse_chapters(payload: &Value) -> Result<Vec<Chapter>, GenerationError> {
    let chapters = payload
        .get("chapters")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            GenerationError::Validation("champ \"chapters\" absent ou non tableau".to_string())
        })?;

    chapters
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Chapter::deserialize(c).map_err(|e| {
                GenerationError::Validation(format!("chapitre {} : {}", i + 1, e))
            })
        })
        .collect()
}
