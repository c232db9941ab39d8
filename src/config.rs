//! Configuration loading.
//!
//! Leadline reads an optional `config.toml` (path from `--config`,
//! `$LEADLINE_CONFIG`, or `./config.toml`). Every section has defaults, so a
//! missing file is not an error. Secrets never live here: the file only
//! names the environment variables that hold them (see
//! [`crate::credentials`]).
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Env var naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "LEADLINE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation model settings.
    pub models: ModelsConfig,
    /// Telegram alert settings.
    pub telegram: TelegramConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Lead database settings.
    pub storage: StorageConfig,
    /// Alert queue settings.
    pub notifications: NotificationsConfig,
    /// System instruction settings.
    pub persona: PersonaConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Gemini model settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model name (e.g. "gemini-1.5-flash").
    pub default: String,
    /// Env var holding the API key.
    pub api_key_env: String,
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: "gemini-1.5-flash".to_owned(),
            api_key_env: "GEMINI_API_KEY".to_owned(),
            base_url: crate::providers::gemini::DEFAULT_GEMINI_URL.to_owned(),
            request_timeout_secs: 60,
        }
    }
}

/// Telegram alert settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Env var holding the bot token.
    pub bot_token_env: String,
    /// Env var holding the operator chat id.
    pub chat_id_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: "TELEGRAM_TOKEN".to_owned(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_owned(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
    /// Directory served under `/static`, holding `index.html`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_owned(),
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Lead database settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("leads.db"),
        }
    }
}

/// Alert queue settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Maximum undelivered alerts before new ones are dropped.
    pub queue_capacity: usize,
    /// Seconds to wait for pending alerts on shutdown.
    pub drain_timeout_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            drain_timeout_secs: 5,
        }
    }
}

/// System instruction settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// File replacing the built-in persona text.
    pub system_prompt_file: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotated JSON logs.
    pub logs_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration with env overrides applied.
    ///
    /// `path` wins over `$LEADLINE_CONFIG`, which wins over `./config.toml`.
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let path = resolve_config_path(path, env);
        let mut config = load_config_file(&path)?;
        config.apply_overrides(env);
        Ok(config)
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function so tests avoid mutating the process env.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("GEMINI_MODEL") {
            let v = v.trim();
            if !v.is_empty() {
                v.clone_into(&mut self.models.default);
            }
        }
        if let Some(v) = env("LEADLINE_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = env("LEADLINE_DATABASE") {
            self.storage.database = PathBuf::from(v);
        }
    }

    /// Env var names whose values are needed at runtime.
    pub fn credential_keys(&self) -> Vec<&str> {
        vec![
            self.models.api_key_env.as_str(),
            self.telegram.bot_token_env.as_str(),
            self.telegram.chat_id_env.as_str(),
        ]
    }
}

/// Resolve which config file to read.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(p) = env(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}

/// Read a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::info!(path = %path.display(), "loading config from file");
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config at {}: {e}",
            path.display()
        )),
    }
}
