//! Generative-AI client
//!
//! Thin wrapper over the Gemini `generateContent` REST endpoint. Models
//! come and go, so callers walk an ordered fallback list instead of pinning
//! one name. The `TextModel` seam lets tests script the model.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::ChatMessage;
use crate::{API_CLIENT, config::Config};

/// Model names to try, best first.
pub const MODEL_FALLBACKS: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.0-flash"];

/// Anything that can turn a prompt into text.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// One-shot completion.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Completion over a conversation.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

pub struct GeminiClient {
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn reply(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.clone(),
        }
    }

    async fn generate_content(&self, model: &str, contents: serde_json::Value) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{model}:generateContent?key={}",
            self.base_url, self.api_key
        );

        let response = API_CLIENT
            .post(url)
            .json(&json!({ "contents": contents }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Model {model} answered {status}: {body}"));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {model} response"))?;
        body.reply()
            .ok_or_else(|| anyhow!("Model {model} returned no text"))
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let contents = json!([{ "role": "user", "parts": [{ "text": prompt }] }]);
        self.generate_content(model, contents).await
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|message| {
                // The wire protocol calls the assistant role "model"
                let role = if message.role == "assistant" {
                    "model"
                } else {
                    "user"
                };
                json!({ "role": role, "parts": [{ "text": message.content }] })
            })
            .collect();
        self.generate_content(model, json!(contents)).await
    }
}

/// One-shot completion, walking the model fallback list. Returns the reply
/// together with the model that produced it.
pub async fn generate_with_fallback(
    model: &dyn TextModel,
    prompt: &str,
) -> Result<(String, &'static str)> {
    let mut last_error = None;
    for name in MODEL_FALLBACKS.iter().copied() {
        match model.generate(name, prompt).await {
            Ok(reply) => {
                debug!("Model {} answered", name);
                return Ok((reply, name));
            }
            Err(e) => {
                warn!("Model {} failed: {}", name, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("No models configured")))
}

/// Conversation completion, walking the model fallback list.
pub async fn chat_with_fallback(
    model: &dyn TextModel,
    messages: &[ChatMessage],
) -> Result<(String, &'static str)> {
    let mut last_error = None;
    for name in MODEL_FALLBACKS.iter().copied() {
        match model.chat(name, messages).await {
            Ok(reply) => {
                debug!("Model {} answered", name);
                return Ok((reply, name));
            }
            Err(e) => {
                warn!("Model {} failed: {}", name, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("No models configured")))
}

/// Strip the markdown code fences the model wraps JSON in unpredictably.
#[must_use]
pub fn extract_json(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

/// Model that replays scripted responses in order.
#[cfg(test)]
pub(crate) struct ScriptedModel {
    replies: std::sync::Mutex<std::collections::VecDeque<String>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub(crate) fn new<I: IntoIterator<Item = S>, S: Into<String>>(replies: I) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))
    }

    async fn chat(&self, model: &str, _messages: &[ChatMessage]) -> Result<String> {
        self.generate(model, "").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_fenced() {
        let reply = "```json\n{\"destination\": \"Pokhara\"}\n```";
        assert_eq!(extract_json(reply), "{\"destination\": \"Pokhara\"}");
    }

    #[test]
    fn test_extract_json_bare() {
        let reply = "{\"destination\": \"Pokhara\"}";
        assert_eq!(extract_json(reply), reply);
    }

    #[test]
    fn test_extract_json_plain_fence() {
        let reply = "```\n[1, 2]\n```";
        assert_eq!(extract_json(reply), "[1, 2]");
    }

    #[test]
    fn test_reply_concatenates_parts() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "Day 1"}, {"text": " - Kathmandu"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.reply().unwrap(), "Day 1 - Kathmandu");
    }

    #[test]
    fn test_reply_empty_candidates() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(parsed.reply().is_none());
    }

    struct FlakyModel;

    #[async_trait]
    impl TextModel for FlakyModel {
        async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
            if model == "gemini-2.5-pro" {
                Err(anyhow!("overloaded"))
            } else {
                Ok(format!("answered by {model}"))
            }
        }

        async fn chat(&self, model: &str, _messages: &[ChatMessage]) -> Result<String> {
            self.generate(model, "").await
        }
    }

    #[tokio::test]
    async fn test_fallback_walks_model_list() {
        let (reply, model) = generate_with_fallback(&FlakyModel, "hi").await.unwrap();
        assert_eq!(model, "gemini-2.5-flash");
        assert_eq!(reply, "answered by gemini-2.5-flash");
    }

    struct DeadModel;

    #[async_trait]
    impl TextModel for DeadModel {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
            Err(anyhow!("quota exhausted"))
        }

        async fn chat(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("quota exhausted"))
        }
    }

    #[tokio::test]
    async fn test_fallback_surfaces_last_error() {
        let err = chat_with_fallback(&DeadModel, &[]).await.unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }
}
