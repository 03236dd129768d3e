//! Gemini API client struct, request building, and response parsing.

use std::time::Duration;

use crate::{AiError, AiReply, Message, Role, TokenUsage};

use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// URL of the model resource itself (used to probe availability).
    pub(crate) fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.config.base_url, model)
    }

    pub(crate) fn generate_url(&self, model: &str) -> String {
        format!("{}:generateContent", self.model_url(model))
    }

    /// Build the JSON request body: prior context, then the new user turn.
    pub(crate) fn build_request_body(&self, context: &[Message], text: &str) -> serde_json::Value {
        let contents: Vec<_> = context
            .iter()
            .chain(std::iter::once(&Message::user(text)))
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.content }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(ref system) = self.config.system_prompt {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system }]
            });
        }

        body
    }

    /// Parse a `generateContent` response.
    pub(crate) fn parse_response(json: &serde_json::Value) -> Result<AiReply, AiError> {
        let first = json["candidates"]
            .as_array()
            .ok_or_else(|| AiError::ParseError("no candidates in response".to_string()))?
            .first()
            .ok_or_else(|| AiError::ParseError("empty candidates".to_string()))?;

        let content: String = first["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if content.is_empty() {
            // Blocked prompts come back with a finishReason and no text.
            let reason = first["finishReason"].as_str().unwrap_or("UNKNOWN");
            return Err(AiError::ParseError(format!(
                "candidate has no text (finishReason: {reason})"
            )));
        }

        let usage = TokenUsage {
            input_tokens: json["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0),
            output_tokens: json["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0),
        };

        Ok(AiReply { content, usage })
    }
}
