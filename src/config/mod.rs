//! Configuration management for promsh
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable overriding `datasource.url`
pub const URL_ENV_VAR: &str = "PROMSH_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Datasource configuration
    #[serde(default)]
    pub datasource: DatasourceConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// History configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Completion configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Datasource-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceConfig {
    /// Prometheus server URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// How far back series lookups reach, in seconds
    #[serde(default = "default_lookback")]
    pub lookback: u64,

    /// How long metric metadata is cached, in seconds
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl: u64,

    /// Static JSON snapshot used instead of a server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_file: Option<PathBuf>,
}

/// Display and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (table, json, json-pretty, compact)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,

    /// Enable syntax highlighting
    #[serde(default = "default_syntax_highlighting")]
    pub syntax_highlighting: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Table format (ASCII table layout)
    Table,

    /// Compact JSON format (single-line)
    Json,

    /// Pretty-printed JSON format (multi-line)
    JsonPretty,

    /// One line per item, no decoration
    Compact,
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of history entries
    #[serde(default = "default_max_history_size")]
    pub max_size: usize,

    /// Path to the line editor history file
    #[serde(default = "default_history_file")]
    pub file_path: PathBuf,

    /// Path to the query history file (feeds history completions)
    #[serde(default = "default_query_history_file")]
    pub query_file_path: PathBuf,

    /// Enable history persistence
    #[serde(default = "default_persist_history")]
    pub persist: bool,
}

/// Completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Number of past queries offered at the start of a query
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_lookback() -> u64 {
    12 * 60 * 60
}

fn default_metadata_ttl() -> u64 {
    60
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_color_output() -> bool {
    true
}

fn default_syntax_highlighting() -> bool {
    true
}

fn default_max_history_size() -> usize {
    1000
}

fn promsh_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".promsh")
}

fn default_history_file() -> PathBuf {
    promsh_dir().join("history")
}

fn default_query_history_file() -> PathBuf {
    promsh_dir().join("queries.jsonl")
}

fn default_persist_history() -> bool {
    true
}

fn default_history_limit() -> usize {
    10
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
            lookback: default_lookback(),
            metadata_ttl: default_metadata_ttl(),
            index_file: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color_output: default_color_output(),
            syntax_highlighting: default_syntax_highlighting(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_history_size(),
            file_path: default_history_file(),
            query_file_path: default_query_history_file(),
            persist: default_persist_history(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `path`, or from the default location when `None`.
    /// A missing file yields the defaults. Environment overrides are applied.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.datasource.url = url.trim().to_string();
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        promsh_dir().join("config.toml")
    }

    /// Save configuration to a file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.datasource.validate_url()?;

        if self.datasource.timeout == 0 {
            return Err(invalid("datasource.timeout", "0"));
        }
        if self.history.max_size == 0 {
            return Err(invalid("history.max_size", "0"));
        }
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.datasource.timeout)
    }

    /// Get series lookback window as Duration
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.datasource.lookback)
    }

    /// Get metadata cache TTL as Duration
    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.datasource.metadata_ttl)
    }
}

fn invalid(field: &str, value: &str) -> crate::error::PromshError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl DatasourceConfig {
    /// Check that the URL is an absolute http(s) URL
    pub fn validate_url(&self) -> Result<()> {
        match reqwest::Url::parse(&self.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
            _ => Err(invalid("datasource.url", &self.url)),
        }
    }

    /// Host (and port) part of the URL, for the prompt
    pub fn host(&self) -> String {
        match reqwest::Url::parse(&self.url) {
            Ok(url) => match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                _ => self.url.clone(),
            },
            Err(_) => self.url.clone(),
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl OutputFormat {
    /// Parse a format name as given on the command line
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "compact" => Some(OutputFormat::Compact),
            _ => None,
        }
    }

    /// Check if format is JSON-based
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.datasource.url, "http://localhost:9090");
        assert_eq!(config.display.format, OutputFormat::Table);
        assert!(config.display.color_output);
        assert_eq!(config.completion.history_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [datasource]
            url = "https://prom.example.com"

            [display]
            format = "json-pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.datasource.url, "https://prom.example.com");
        assert_eq!(config.datasource.timeout, 30);
        assert_eq!(config.display.format, OutputFormat::JsonPretty);
        assert_eq!(config.history.max_size, 1000);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[datasource\nurl = 1").unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: Invalid config format"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("promsh").join("config.toml");

        let mut config = Config::default();
        config.datasource.url = "http://prom:9090".to_string();
        config.datasource.index_file = Some(PathBuf::from("/tmp/snapshot.json"));
        config.logging.level = LogLevel::Debug;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.datasource.url, "http://prom:9090");
        assert_eq!(
            loaded.datasource.index_file,
            Some(PathBuf::from("/tmp/snapshot.json"))
        );
        assert_eq!(loaded.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/promsh.toml"),
            Err(crate::error::PromshError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_validate_url() {
        let mut config = Config::default();
        config.datasource.url = "localhost:9090".to_string();
        assert!(config.validate().is_err());

        config.datasource.url = "ftp://host".to_string();
        assert!(config.validate().is_err());

        config.datasource.url = "https://prom.example.com/prometheus".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sizes() {
        let mut config = Config::default();
        config.history.max_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.datasource.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_host() {
        let mut ds = DatasourceConfig::default();
        assert_eq!(ds.host(), "localhost:9090");
        ds.url = "https://prom.example.com".to_string();
        assert_eq!(ds.host(), "prom.example.com");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::parse("nope"), None);
        assert!(OutputFormat::JsonPretty.is_json());
        assert!(!OutputFormat::Table.is_json());
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.lookback(), Duration::from_secs(43200));
        assert_eq!(config.metadata_ttl(), Duration::from_secs(60));
    }
}
