use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Ollama,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAI => "gpt-4.1-mini",
            ProviderKind::Ollama => "llama3.1",
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    /// Provider-specific variable holding the API key; `None` when no key is needed.
    pub fn credential_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "seo_pilot", version, about = "AI-assisted SEO dashboard for the terminal")]
pub struct Args {
    /// Model backend; overrides the config file.
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the model API, e.g. a proxy or a remote Ollama.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Per-request timeout; slow responses are treated as failures.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Optional TOML file with the same keys as the flags.
    #[arg(long)]
    pub config: Option<String>,

    /// Disable copying to the terminal clipboard (OSC 52).
    #[arg(long, default_value_t = false)]
    pub no_clipboard: bool,

    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
