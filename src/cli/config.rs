//! `config`: show the effective configuration.

use crate::config::{AppConfig, default_config_path};
use crate::observability::LogFormat;
use std::fmt::Write as _;

/// Renders the effective configuration as `key = value` lines.
#[must_use]
pub fn cmd_config_show(config: &AppConfig) -> String {
    let source = config
        .source
        .as_ref()
        .or(default_config_path().as_ref().filter(|p| p.exists()))
        .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
    let log_path = config
        .log
        .path
        .as_ref()
        .map_or_else(|| "(disabled)".to_string(), |p| p.display().to_string());
    let format = match config.log.format {
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    let mut out = String::new();
    let _ = writeln!(out, "# source: {source}");
    let _ = writeln!(out, "db_path = {}", config.db_path.display());
    let _ = writeln!(out, "max_keywords_per_server = {}", config.max_keywords_per_server);
    let _ = writeln!(out, "identity_cache_capacity = {}", config.identity_cache_capacity);
    let _ = writeln!(out, "log.path = {log_path}");
    let _ = writeln!(out, "log.level = {}", config.log.level);
    let _ = writeln!(out, "log.format = {format}");
    let _ = writeln!(out, "metrics.enabled = {}", config.metrics.enabled);
    let _ = write!(out, "metrics.port = {}", config.metrics.port);
    out
}
