//! Google Generative Language API client.

use super::{ModelError, TextModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One Gemini model behind `POST /v1beta/models/{model}:generateContent?key={key}`.
pub struct GeminiModel {
    /// Model identifier (e.g. "gemini-1.5-flash")
    model: String,
    /// Base URL (e.g. "https://generativelanguage.googleapis.com")
    base_url: String,
    /// API key for query parameter authentication
    api_key: String,
    /// Shared HTTP client for connection pooling
    client: Client,
    timeout: Duration,
}

impl GeminiModel {
    pub fn new(
        model: String,
        base_url: String,
        api_key: String,
        client: Client,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout,
        }
    }

    fn build_request(prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(&self, response: GeminiResponse) -> Result<String, ModelError> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            ModelError::fatal(&self.model, "response contained no candidates")
        })?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ModelError::fatal(
                &self.model,
                "response blocked by safety filter",
            ));
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[async_trait]
impl TextModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        tracing::debug!(model = %self.model, "requesting content generation");

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&Self::build_request(prompt))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::unavailable(
                        &self.model,
                        format!("request timed out after {}ms", self.timeout.as_millis()),
                    )
                } else {
                    ModelError::fatal(&self.model, format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::info!(
                model = %self.model,
                status = %status,
                latency_ms = start.elapsed().as_millis() as u64,
                "content generation failed"
            );
            return Err(ModelError::from_status(&self.model, status.as_u16(), body));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            ModelError::fatal(&self.model, format!("failed to parse response: {}", e))
        })?;

        tracing::info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "content generation succeeded"
        );
        self.extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GeminiModel {
        GeminiModel::new(
            "gemini-1.5-flash".to_string(),
            "http://localhost/".to_string(),
            "key".to_string(),
            Client::new(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(GeminiModel::build_request("hello")).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"- a\n"},{"text":"- b"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(model().extract_text(response).unwrap(), "- a\n- b");
    }

    #[test]
    fn test_extract_text_without_candidates_is_fatal() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        let err = model().extract_text(response).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_safety_block_is_fatal() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = model().extract_text(response).unwrap_err();
        assert!(err.message.contains("safety"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(model().base_url, "http://localhost");
    }
}
