use std::path::Path;
use std::time::Duration;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{Args, ProviderKind};
use crate::errors::ConfigError;

/// Checked before the provider-specific variable, for any provider.
pub const GENERIC_KEY_VAR: &str = "SEO_PILOT_API_KEY";

/// Keys accepted in the optional TOML file. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub clipboard: Option<bool>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

/// Resolved settings. The credential is read once here and never again.
#[derive(Clone, Serialize)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub clipboard: bool,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("clipboard", &self.clipboard)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let provider = ProviderKind::default();
        Self {
            provider,
            model: provider.default_model().into(),
            api_base: provider.default_api_base().into(),
            timeout_secs: 30,
            clipboard: true,
            api_key: None,
        }
    }
}

impl Config {
    /// Loads `.env`, the optional config file, then applies flags and the environment.
    pub fn load(args: &Args) -> Result<Config, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let file = match &args.config {
            Some(p) => FileConfig::read(Path::new(p))?,
            None => FileConfig::default(),
        };
        Config::resolve(args, file, |var| std::env::var(var).ok())
    }

    /// Precedence: flags, then file, then defaults. `env` is only consulted for the credential.
    pub fn resolve<F>(args: &Args, file: FileConfig, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = args.provider.or(file.provider).unwrap_or_default();
        let model = args
            .model
            .clone()
            .or(file.model)
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_base = args
            .api_base
            .clone()
            .or(file.api_base)
            .unwrap_or_else(|| provider.default_api_base().to_string());
        let timeout_secs = args.timeout_secs.or(file.timeout_secs).unwrap_or(30);
        let clipboard = !args.no_clipboard && file.clipboard.unwrap_or(true);

        let api_key = match provider.credential_var() {
            Some(var) => {
                let key = [GENERIC_KEY_VAR, var, "API_KEY"]
                    .into_iter()
                    .filter_map(|v| env(v))
                    .map(|k| k.trim().to_string())
                    .find(|k| !k.is_empty())
                    .ok_or(ConfigError::MissingCredential { var })?;
                Some(key)
            }
            None => None,
        };

        let cfg = Config { provider, model, api_base, timeout_secs, clipboard, api_key };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue { field: "model".into(), reason: "must not be empty".into() });
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base".into(),
                reason: format!("'{}' is not an http(s) URL", self.api_base),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
