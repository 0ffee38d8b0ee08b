//! Configuration loading and validation for Concierge.
//!
//! Non-secret defaults come from `~/.concierge/config.toml` (optional);
//! provider credentials come from the environment and are required:
//!
//! - `OWM_API_KEY`       — OpenWeatherMap API key
//! - `SLACK_BOT_TOKEN`   — Slack bot token (xoxb-...)
//!
//! Missing either is a fatal startup error — the process never reaches
//! the REPL without both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fully resolved runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// OpenWeatherMap API key (from `OWM_API_KEY`)
    pub owm_api_key: String,

    /// Slack bot token (from `SLACK_BOT_TOKEN`)
    pub slack_bot_token: String,

    /// Display name of the end user
    pub user_name: String,

    /// Default city for the session context
    pub location: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Base URL of the OpenAI-compatible chat endpoint
    pub provider_base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Slack channel tool messages are posted to
    pub slack_channel: String,
}

/// The optional on-disk defaults file (`~/.concierge/config.toml`).
///
/// Credentials deliberately have no place here — they are environment-only
/// so a shared config file can't leak them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_user_name")]
    user_name: String,

    #[serde(default = "default_location")]
    location: String,

    #[serde(default = "default_model")]
    model: String,

    #[serde(default = "default_provider_base_url")]
    provider_base_url: String,

    #[serde(default = "default_temperature")]
    temperature: f32,

    #[serde(default = "default_slack_channel")]
    slack_channel: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            location: default_location(),
            model: default_model(),
            provider_base_url: default_provider_base_url(),
            temperature: default_temperature(),
            slack_channel: default_slack_channel(),
        }
    }
}

fn default_user_name() -> String {
    "Christopher Lillthors".into()
}
fn default_location() -> String {
    "Stockholm".into()
}
fn default_model() -> String {
    "llama3.1".into()
}
fn default_provider_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_slack_channel() -> String {
    "#customer-support-agent".into()
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("owm_api_key", &"[REDACTED]")
            .field("slack_bot_token", &"[REDACTED]")
            .field("user_name", &self.user_name)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("provider_base_url", &self.provider_base_url)
            .field("temperature", &self.temperature)
            .field("slack_channel", &self.slack_channel)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default file path and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::from_sources(Some(&config_path), &|key| std::env::var(key).ok())
    }

    /// Load configuration from explicit sources.
    ///
    /// `env` is injectable so tests can exercise the missing-credential
    /// paths without touching the process environment.
    pub fn from_sources(
        file: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = match file {
            Some(path) => Self::load_file(path)?,
            None => ConfigFile::default(),
        };

        let owm_api_key = env("OWM_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("OWM_API_KEY".into()))?;
        let slack_bot_token = env("SLACK_BOT_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("SLACK_BOT_TOKEN".into()))?;

        let config = Self {
            owm_api_key,
            slack_bot_token,
            user_name: defaults.user_name,
            location: defaults.location,
            model: defaults.model,
            provider_base_url: defaults.provider_base_url,
            temperature: defaults.temperature,
            slack_channel: defaults.slack_channel,
        };
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(ConfigFile::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".concierge")
    }

    /// Fixed path of the REPL input-history file.
    pub fn history_path() -> PathBuf {
        dirs_home().join(".concierge_history")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !self.slack_channel.starts_with('#') {
            return Err(ConfigError::ValidationError(
                "slack_channel must start with '#'".into(),
            ));
        }
        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Please set the {0} environment variable")]
    MissingEnv(String),

    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_with(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_owm_key_names_the_variable() {
        let env = env_with(&[("SLACK_BOT_TOKEN", "xoxb-test")]);
        let err = AppConfig::from_sources(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref v) if v == "OWM_API_KEY"));
        assert!(err.to_string().contains("OWM_API_KEY"));
    }

    #[test]
    fn missing_slack_token_names_the_variable() {
        let env = env_with(&[("OWM_API_KEY", "abc123")]);
        let err = AppConfig::from_sources(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref v) if v == "SLACK_BOT_TOKEN"));
    }

    #[test]
    fn empty_credential_counts_as_missing() {
        let env = env_with(&[("OWM_API_KEY", ""), ("SLACK_BOT_TOKEN", "xoxb-test")]);
        let err = AppConfig::from_sources(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref v) if v == "OWM_API_KEY"));
    }

    #[test]
    fn defaults_without_config_file() {
        let env = env_with(&[("OWM_API_KEY", "abc123"), ("SLACK_BOT_TOKEN", "xoxb-test")]);
        let config = AppConfig::from_sources(None, &env).unwrap();
        assert_eq!(config.location, "Stockholm");
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.slack_channel, "#customer-support-agent");
        assert_eq!(config.provider_base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "location = \"Paris\"\nmodel = \"llama3.2\"").unwrap();

        let env = env_with(&[("OWM_API_KEY", "abc123"), ("SLACK_BOT_TOKEN", "xoxb-test")]);
        let config = AppConfig::from_sources(Some(file.path()), &env).unwrap();
        assert_eq!(config.location, "Paris");
        assert_eq!(config.model, "llama3.2");
        // Untouched fields keep their defaults
        assert_eq!(config.user_name, "Christopher Lillthors");
    }

    #[test]
    fn nonexistent_config_file_falls_back_to_defaults() {
        let env = env_with(&[("OWM_API_KEY", "abc123"), ("SLACK_BOT_TOKEN", "xoxb-test")]);
        let config =
            AppConfig::from_sources(Some(Path::new("/nonexistent/config.toml")), &env).unwrap();
        assert_eq!(config.location, "Stockholm");
    }

    #[test]
    fn invalid_channel_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "slack_channel = \"customer-support\"").unwrap();

        let env = env_with(&[("OWM_API_KEY", "abc123"), ("SLACK_BOT_TOKEN", "xoxb-test")]);
        let err = AppConfig::from_sources(Some(file.path()), &env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let env = env_with(&[("OWM_API_KEY", "abc123"), ("SLACK_BOT_TOKEN", "xoxb-secret")]);
        let config = AppConfig::from_sources(None, &env).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("xoxb-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
