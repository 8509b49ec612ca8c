use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{http_client, parse_envelope, success_body, transport_error, Gateway, InvokeOptions};
use crate::errors::{ConfigError, GatewayError};

/// OpenAI-compatible chat completions. The prompt goes in as a single user
/// message with no system scaffolding.
pub struct OpenAIProvider {
    model: String,
    api_base: String,
    api_key: String,
    client: Client,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(model: String, api_base: String, api_key: String, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self { model, api_base, api_key, client: http_client(timeout)?, timeout })
    }

    fn body(&self, prompt: &str, opts: InvokeOptions) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7,
        });
        if opts.structured {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

fn first_content(resp: ChatResponse) -> Result<String, GatewayError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(GatewayError::EmptyResponse)
}

#[async_trait]
impl Gateway for OpenAIProvider {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        debug!(model = %self.model, structured = opts.structured, prompt_bytes = prompt.len(), "openai: POST chat/completions");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.body(prompt, opts))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let status = resp.status().as_u16();
        let text = success_body(resp, "openai", self.timeout).await?;
        first_content(parse_envelope(&text, status)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new("gpt-4.1-mini".into(), "https://api.openai.com".into(), "k".into(), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn json_mode_only_when_structured() {
        let p = provider();
        assert_eq!(p.body("x", InvokeOptions { structured: true })["response_format"], json!({"type": "json_object"}));
        assert!(p.body("x", InvokeOptions::default()).get("response_format").is_none());
        assert_eq!(p.body("x", InvokeOptions::default())["messages"][0]["content"], "x");
    }

    #[test]
    fn null_content_is_empty_response() {
        let resp: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"role": "assistant", "content": null}}]})).unwrap();
        assert_eq!(first_content(resp), Err(GatewayError::EmptyResponse));

        let resp: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "{\"a\":1}"}}]})).unwrap();
        assert_eq!(first_content(resp), Ok("{\"a\":1}".to_string()));
    }
}
