//! The AI gateway: the only code that talks to the model API.
//!
//! Every backend returns `Result<String, GatewayError>`; transport errors,
//! HTTP failures and timeouts are all folded into [`GatewayError`] here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use tracing::debug;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::{ConfigError, GatewayError};

pub mod gemini;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub mod scripted;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Ask the backend itself to emit a single JSON document.
    pub structured: bool,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError>;
}

pub type DynGateway = Arc<dyn Gateway>;

pub fn make_gateway(cfg: &Config) -> Result<DynGateway, ConfigError> {
    let timeout = cfg.timeout();
    let key = || {
        cfg.api_key.clone().ok_or(ConfigError::MissingCredential {
            var: cfg.provider.credential_var().unwrap_or("SEO_PILOT_API_KEY"),
        })
    };
    let inner: DynGateway = match cfg.provider {
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
            cfg.model.clone(),
            cfg.api_base.clone(),
            key()?,
            timeout,
        )?),
        ProviderKind::OpenAI => Arc::new(openai::OpenAIProvider::new(
            cfg.model.clone(),
            cfg.api_base.clone(),
            key()?,
            timeout,
        )?),
        ProviderKind::Ollama => Arc::new(ollama::Ollama::new(cfg.model.clone(), cfg.api_base.clone(), timeout)?),
    };
    Ok(Arc::new(Bounded::new(inner, timeout)))
}

/// Hard deadline around any gateway, HTTP-backed or not.
pub struct Bounded {
    inner: DynGateway,
    timeout: Duration,
}

impl Bounded {
    pub fn new(inner: DynGateway, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Gateway for Bounded {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError> {
        match tokio::time::timeout(self.timeout, self.inner.invoke(prompt, opts)).await {
            Ok(res) => res,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

pub(crate) fn transport_error(e: reqwest::Error, timeout: Duration) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(timeout)
    } else {
        GatewayError::from(e)
    }
}

/// Reads the body, turning a non-2xx status into `GatewayError::Status`.
pub(crate) async fn success_body(resp: Response, backend: &str, timeout: Duration) -> Result<String, GatewayError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| transport_error(e, timeout))?;
    debug!(backend, status = status.as_u16(), bytes = text.len(), "model API responded");
    if !status.is_success() {
        let body: String = text.chars().take(500).collect();
        return Err(GatewayError::Status { status: status.as_u16(), body });
    }
    Ok(text)
}

/// Parses a provider envelope; a body that is not the expected envelope is
/// reported like a server error so the caller sees one failure shape.
pub(crate) fn parse_envelope<T: serde::de::DeserializeOwned>(text: &str, status: u16) -> Result<T, GatewayError> {
    serde_json::from_str(text).map_err(|e| GatewayError::Status {
        status,
        body: format!("unexpected response envelope: {e}"),
    })
}
