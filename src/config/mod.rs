//! Configuration management.
//!
//! Values are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `KEYWORD_BOT_CONFIG_PATH`, or
//!    `<config dir>/keyword-notifier/config.toml`)
//! 3. Environment variables (a `.env` file is loaded first if present)
//!
//! ```toml
//! db_path = "data/keywords.db"
//! max_keywords_per_server = 10
//! identity_cache_capacity = 1024
//!
//! [log]
//! path = "bot.log"
//! level = "INFO"
//! format = "pretty"
//!
//! [metrics]
//! enabled = false
//! port = 9090
//! ```

use crate::observability::LogFormat;
use crate::platform::DEFAULT_IDENTITY_CACHE_CAPACITY;
use crate::services::DEFAULT_MAX_KEYWORDS_PER_SERVER;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "KEYWORD_BOT_CONFIG_PATH";

const DB_PATH_ENV: &str = "KEYWORD_BOT_DB";
const LOG_PATH_ENV: &str = "KEYWORD_BOT_LOG_PATH";
const LOG_LEVEL_ENV: &str = "KEYWORD_BOT_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "KEYWORD_BOT_LOG_FORMAT";
const METRICS_ENABLED_ENV: &str = "KEYWORD_BOT_METRICS_ENABLED";
const METRICS_PORT_ENV: &str = "KEYWORD_BOT_METRICS_PORT";

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Subscription database file.
    pub db_path: PathBuf,
    /// Logging settings.
    pub log: LogConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
    /// Subscriptions a user may hold per server.
    pub max_keywords_per_server: usize,
    /// Entries in the shared identity cache.
    pub identity_cache_capacity: usize,
    /// File the configuration was loaded from, if any.
    pub source: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log file appended to alongside stdout. `None` disables file output.
    pub path: Option<PathBuf>,
    /// Minimum level (`TRACE` through `ERROR`, case-insensitive).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Metrics settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to serve a Prometheus endpoint.
    pub enabled: bool,
    /// Listener port.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/keywords.db"),
            log: LogConfig::default(),
            metrics: MetricsConfig::default(),
            max_keywords_per_server: DEFAULT_MAX_KEYWORDS_PER_SERVER,
            identity_cache_capacity: DEFAULT_IDENTITY_CACHE_CAPACITY,
            source: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("bot.log")),
            level: "INFO".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub db_path: Option<String>,
    /// Per-server keyword limit.
    pub max_keywords_per_server: Option<usize>,
    /// Identity cache size.
    pub identity_cache_capacity: Option<usize>,
    /// Logging section.
    pub log: Option<ConfigFileLog>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// `[log]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLog {
    /// Log file path; an empty string disables file output.
    pub path: Option<String>,
    /// Level name.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
}

/// `[metrics]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileMetrics {
    /// Serve Prometheus metrics.
    pub enabled: Option<bool>,
    /// Listener port.
    pub port: Option<u16>,
}

impl AppConfig {
    /// Loads configuration for the running process.
    ///
    /// Reads `.env`, then the first config file found (`explicit`, then
    /// `KEYWORD_BOT_CONFIG_PATH`, then the platform config dir), then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    /// A missing default file is not an error.
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        let _ = dotenvy::dotenv();

        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let mut config = Self::from_toml_str(&contents)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads `<config dir>/keyword-notifier/config.toml`, or defaults.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(max) = file.max_keywords_per_server {
            config.max_keywords_per_server = max;
        }
        if let Some(capacity) = file.identity_cache_capacity {
            config.identity_cache_capacity = capacity;
        }
        if let Some(log) = file.log {
            if let Some(path) = log.path {
                config.log.path = non_empty_path(&path);
            }
            if let Some(level) = log.level {
                config.log.level = level;
            }
            if let Some(format) = log.format {
                config.log.format = LogFormat::parse(&format);
            }
        }
        if let Some(metrics) = file.metrics {
            if let Some(enabled) = metrics.enabled {
                config.metrics.enabled = enabled;
            }
            if let Some(port) = metrics.port {
                config.metrics.port = port;
            }
        }

        config
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Unparseable numeric or boolean values are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(DB_PATH_ENV) {
            self.db_path = PathBuf::from(db);
        }
        if let Some(path) = lookup(LOG_PATH_ENV) {
            self.log.path = non_empty_path(&path);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log.level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            self.log.format = LogFormat::parse(&format);
        }
        if let Some(enabled) = lookup(METRICS_ENABLED_ENV) {
            match parse_bool(&enabled) {
                Some(v) => self.metrics.enabled = v,
                None => tracing::warn!(value = %enabled, "Ignoring invalid {METRICS_ENABLED_ENV}"),
            }
        }
        if let Some(port) = lookup(METRICS_PORT_ENV) {
            match port.trim().parse() {
                Ok(v) => self.metrics.port = v,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid {METRICS_PORT_ENV}"),
            }
        }
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// Returns the platform default config file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("keyword-notifier")
            .join("config.toml")
    })
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn test_defaults_match_bot_environment() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("data/keywords.db"));
        assert_eq!(config.log.path, Some(PathBuf::from("bot.log")));
        assert_eq!(config.log.level, "INFO");
        assert_eq!(config.max_keywords_per_server, 10);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_toml_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            db_path = "/var/lib/bot/kw.db"
            max_keywords_per_server = 25

            [log]
            path = ""
            level = "debug"
            format = "json"

            [metrics]
            enabled = true
            port = 9100
            "#,
        )
        .expect("valid config");

        assert_eq!(config.db_path, PathBuf::from("/var/lib/bot/kw.db"));
        assert_eq!(config.max_keywords_per_server, 25);
        assert_eq!(config.log.path, None);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.metrics, MetricsConfig { enabled: true, port: 9100 });
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_toml_str("db = 'x'").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("KEYWORD_BOT_DB", "/tmp/env.db"),
            ("KEYWORD_BOT_LOG_LEVEL", "WARN"),
            ("KEYWORD_BOT_METRICS_ENABLED", "yes"),
            ("KEYWORD_BOT_METRICS_PORT", "not-a-port"),
        ]);
        let mut config = AppConfig::from_toml_str("db_path = 'file.db'").expect("valid");
        config.apply_env(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.db_path, PathBuf::from("/tmp/env.db"));
        assert_eq!(config.log.level, "WARN");
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9090);
    }

    #[test]
    fn test_load_from_file_records_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "identity_cache_capacity = 16\n").expect("write");

        let config = AppConfig::load_from_file(&path).expect("load");
        assert_eq!(config.identity_cache_capacity, 16);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test_case("true" => Some(true))]
    #[test_case(" ON " => Some(true))]
    #[test_case("0" => Some(false))]
    #[test_case("maybe" => None)]
    fn test_parse_bool(raw: &str) -> Option<bool> {
        parse_bool(raw)
    }
}
