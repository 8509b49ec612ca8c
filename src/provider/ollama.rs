use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, parse_envelope, success_body, transport_error, Gateway, InvokeOptions};
use crate::errors::{ConfigError, GatewayError};

/// Local Ollama server; no credential.
pub struct Ollama {
    model: String,
    url: String,
    client: Client,
    timeout: Duration,
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self { model, url, client: http_client(timeout)?, timeout })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    #[serde(default)]
    content: String,
}

fn chat_request<'a>(model: &'a str, prompt: &'a str, opts: InvokeOptions) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![Msg { role: "user", content: prompt }],
        stream: false,
        format: opts.structured.then_some("json"),
        options: OllamaOptions { temperature: 0.4 },
    }
}

#[async_trait]
impl Gateway for Ollama {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        debug!(model = %self.model, structured = opts.structured, "ollama: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(&chat_request(&self.model, prompt, opts))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let status = resp.status().as_u16();
        let text = success_body(resp, "ollama", self.timeout).await?;
        let parsed: ChatResponse = parse_envelope(&text, status)?;
        if parsed.message.content.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(parsed.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn structured_requests_ask_for_json_format() {
        let body = serde_json::to_value(chat_request("llama3.1", "hi", InvokeOptions { structured: true })).unwrap();
        assert_eq!(body["format"], json!("json"));
        assert_eq!(body["stream"], json!(false));
        let body = serde_json::to_value(chat_request("llama3.1", "hi", InvokeOptions::default())).unwrap();
        assert!(body.get("format").is_none());
    }
}
