use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LLMConfig,
    pub behavior: BehaviorConfig,
    pub git: GitConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LLMConfig {
    /// Base URL of the Ollama server
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    pub log_commands: bool,
    pub offer_push_after_commit: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,
    pub fallback_branch: String,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen3:4b".to_string(),
            temperature: 0.1,
            max_tokens: 128,
            stream: true,
            timeout_seconds: 120,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_commands: true,
            offer_push_after_commit: true,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            fallback_branch: "main".to_string(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitpilot"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the default config file, or defaults if it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(ConfigError::DirectoryNotFound) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Load configuration from `path`; a missing file yields defaults.
    /// The file is only ever read.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.llm.endpoint.starts_with("http://") && !self.llm.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "endpoint must be an http(s) URL, got: {}",
                self.llm.endpoint
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue("model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue(format!(
                "temperature must be between 0.0 and 2.0, got: {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("remote", &self.git.remote),
            ("fallback_branch", &self.git.fallback_branch),
        ] {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be a single non-empty word, got: {:?}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
