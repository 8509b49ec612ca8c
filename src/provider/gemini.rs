use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, parse_envelope, success_body, transport_error, Gateway, InvokeOptions};
use crate::errors::{ConfigError, GatewayError};

/// Google Gemini `generateContent`.
pub struct GeminiProvider {
    model: String,
    api_base: String,
    api_key: String,
    client: Client,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(model: String, api_base: String, api_key: String, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self { model, api_base, api_key, client: http_client(timeout)?, timeout })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

fn request_body(prompt: &str, opts: InvokeOptions) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content { role: "user", parts: vec![Part { text: prompt }] }],
        generation_config: opts
            .structured
            .then_some(GenerationConfig { response_mime_type: "application/json" }),
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(resp: GenerateResponse) -> Result<String, GatewayError> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl Gateway for GeminiProvider {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError> {
        let url = self.endpoint();
        debug!(model = %self.model, structured = opts.structured, prompt_bytes = prompt.len(), "gemini: POST generateContent");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, opts))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let status = resp.status().as_u16();
        let text = success_body(resp, "gemini", self.timeout).await?;
        extract_text(parse_envelope(&text, status)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn structured_flag_sets_response_mime_type() {
        let body = serde_json::to_value(request_body("hi", InvokeOptions { structured: true })).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {"responseMimeType": "application/json"}
            })
        );
        let plain = serde_json::to_value(request_body("hi", InvokeOptions::default())).unwrap();
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn joins_candidate_parts() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"score\":"}, {"text": "80}"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(extract_text(resp), Ok("{\"score\":80}".to_string()));
    }

    #[test]
    fn blocked_prompt_is_empty_response() {
        let resp: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(extract_text(resp), Err(GatewayError::EmptyResponse));
    }

    #[test]
    fn endpoint_includes_model() {
        let p = GeminiProvider::new(
            "gemini-2.5-flash".into(),
            "https://generativelanguage.googleapis.com/".into(),
            "k".into(),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(
            p.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
