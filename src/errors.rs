use std::time::Duration;

use thiserror::Error;

/// Startup-time configuration problems. Never raised per request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing API credential: set {var} (or SEO_PILOT_API_KEY) in the environment or .env")]
    MissingCredential { var: &'static str },
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Anything that went wrong between handing a prompt to the backing model and
/// getting text back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

/// Model text that could not be turned into the expected artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedResponse {
    #[error("response is not valid JSON for this artifact: {0}")]
    Parse(String),
    #[error("response failed validation: {0}")]
    Invalid(String),
    #[error("response was empty")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("website URL is required")]
    MissingUrl,
    #[error("business name is required")]
    MissingName,
    #[error("onboarding has already been completed")]
    AlreadyOnboarded,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("complete onboarding before opening other views")]
    NotOnboarded,
    #[error("onboarding cannot be re-entered")]
    OnboardingClosed,
}
