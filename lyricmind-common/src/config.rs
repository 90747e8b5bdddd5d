//! Bootstrap configuration loading
//!
//! Configuration lives in a single TOML file. Every field has a built-in
//! default so a missing file (or a missing section) still yields a usable
//! configuration.
//!
//! # Config file resolution
//! 1. Explicit path (command-line argument or `LYRICMIND_CONFIG`)
//! 2. `<config_dir>/lyricmind/config.toml`
//! 3. Built-in defaults
//!
//! Secrets (API keys, tokens) may additionally be overridden from the
//! environment; that resolution is done by the service crate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite cache database (relative paths resolve against the config file)
    pub database_path: Option<PathBuf>,

    /// LLM backend selection and tuning
    pub llm: LlmConfig,

    /// Lyrics provider credentials
    pub providers: ProvidersConfig,

    /// Analysis framework location
    pub framework: FrameworkConfig,

    /// HTTP API bind address
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// LLM configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend name: "openai", "anthropic" or "ollama"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Extra attempts after the first failed request
    pub max_retries: u32,
    pub max_tokens: u32,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub ollama_base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.2,
            timeout_seconds: 120,
            max_retries: 2,
            max_tokens: 4096,
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com/v1".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }
}

/// Lyrics provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub genius_token: Option<String>,
    pub musixmatch_api_key: Option<String>,
    /// Per-request timeout for provider HTTP calls
    pub timeout_seconds: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            genius_token: None,
            musixmatch_api_key: None,
            timeout_seconds: 10,
        }
    }
}

/// Framework directory configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Directory scanned for `*.txt` prompt templates
    pub directory: PathBuf,
    /// Framework used when the caller names none
    pub default: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("frameworks"),
            default: "vanilla".to_string(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Load configuration, falling back to defaults when no file is found
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let Some(path) = path else {
            warn!("No config file found, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file not found at {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let mut config = Self::from_file(&path)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a TOML config file without any path resolution
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        if self.framework.directory.is_relative() {
            self.framework.directory = base.join(&self.framework.directory);
        }
        if let Some(db_path) = &self.database_path {
            if db_path.is_relative() {
                self.database_path = Some(base.join(db_path));
            }
        }
        if let Some(log_file) = &self.logging.file {
            if log_file.is_relative() {
                self.logging.file = Some(base.join(log_file));
            }
        }
    }

    /// Database path from config, or the OS-dependent default
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Platform config file location (`~/.config/lyricmind/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lyricmind").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lyricmind"))
        .unwrap_or_else(|| PathBuf::from("./lyricmind_data"))
        .join("lyrics.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TomlConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.providers.timeout_seconds, 10);
        assert_eq!(config.framework.default, "vanilla");
        assert_eq!(config.api.port, 5001);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [llm]
            provider = "ollama"
            model = "llama3"

            [providers]
            genius_token = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.providers.genius_token.as_deref(), Some("abc"));
        assert_eq!(config.providers.timeout_seconds, 10);
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[llm\nprovider = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_explicit_file_uses_defaults() {
        let config = TomlConfig::load(Some(Path::new("/nonexistent/lyricmind.toml"))).unwrap();
        assert_eq!(config.framework.default, "vanilla");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            database_path = "data/cache.db"

            [framework]
            directory = "prompts"
            "#,
        )
        .unwrap();

        let config = TomlConfig::load(Some(&path)).unwrap();
        assert_eq!(config.framework.directory, dir.path().join("prompts"));
        assert_eq!(config.database_path(), dir.path().join("data/cache.db"));
    }

    #[test]
    fn test_default_database_path_file_name() {
        assert!(default_database_path().ends_with("lyrics.db"));
    }
}
