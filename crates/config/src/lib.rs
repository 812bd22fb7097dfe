//! Configuration loading, validation, and management for Helpline.
//!
//! Loads configuration from `~/.helpline/config.toml` with environment
//! variable overrides. Validates all settings at startup. The [`data`]
//! module loads the knowledge, context-catalog and customer-data files the
//! configuration points at.

pub mod data;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use data::{load_catalog, load_customer_data, load_knowledge};

/// The root configuration structure.
///
/// Maps directly to `~/.helpline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for every call
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling for the final answer call
    #[serde(default = "CallConfig::answer")]
    pub answer: CallConfig,

    /// Sampling for the two classification calls
    #[serde(default = "CallConfig::classifier")]
    pub classifier: CallConfig,

    /// HTTP timeouts and retries
    #[serde(default)]
    pub http: HttpConfig,

    /// Conversation window settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Knowledge, catalog and customer data locations
    #[serde(default)]
    pub data: DataConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Optional prompt text overrides
    #[serde(default)]
    pub prompt: PromptConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("answer", &self.answer)
            .field("classifier", &self.classifier)
            .field("http", &self.http)
            .field("history", &self.history)
            .field("data", &self.data)
            .field("gateway", &self.gateway)
            .field("prompt", &self.prompt)
            .finish()
    }
}

/// Temperature and output budget of one kind of completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CallConfig {
    pub fn answer() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 256,
        }
    }

    pub fn classifier() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra attempts on transient failures (0 = no retry)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_connect_timeout() -> u64 {
    15
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Window bound in messages (two per exchange)
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Messages of history folded into the classification query
    #[serde(default = "default_lookback")]
    pub classification_lookback: usize,
}

fn default_max_messages() -> usize {
    helpline_core::DEFAULT_MAX_MESSAGES
}
fn default_lookback() -> usize {
    4
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            classification_lookback: default_lookback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_data_path: Option<PathBuf>,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/knowledge.json")
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/context_schemas.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            knowledge_path: default_knowledge_path(),
            catalog_path: default_catalog_path(),
            customer_data_path: Some(PathBuf::from("data/customer_data.json")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum concurrently tracked sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Replaces the built-in persona or safety text of the answering prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.helpline/config.toml).
    ///
    /// Environment variables override the file:
    /// - `HELPLINE_API_KEY`, then `OPENAI_API_KEY`
    /// - `HELPLINE_MODEL`
    /// - `HELPLINE_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("HELPLINE_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Some(model) = lookup("HELPLINE_MODEL") {
            self.model = model;
        }

        if let Some(url) = lookup("HELPLINE_API_URL") {
            self.api_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".helpline")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, call) in [("answer", &self.answer), ("classifier", &self.classifier)] {
            if !(0.0..=2.0).contains(&call.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if call.max_tokens == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.max_tokens must be > 0"
                )));
            }
        }

        if self.history.max_messages < 2 || self.history.max_messages % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "history.max_messages must be an even number >= 2".into(),
            ));
        }

        if self.history.classification_lookback == 0 {
            return Err(ConfigError::ValidationError(
                "history.classification_lookback must be >= 1".into(),
            ));
        }

        if self.gateway.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_sessions must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            answer: CallConfig::answer(),
            classifier: CallConfig::classifier(),
            http: HttpConfig::default(),
            history: HistoryConfig::default(),
            data: DataConfig::default(),
            gateway: GatewayConfig::default(),
            prompt: PromptConfig::default(),
        }
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
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
