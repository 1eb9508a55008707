//! Logging and metrics.
//!
//! [`init`] installs one `tracing` subscriber for the process:
//!
//! - an [`EnvFilter`] from `RUST_LOG`, else the configured level
//! - a stdout layer (pretty or JSON)
//! - an append-only file layer when a log path is configured
//!
//! A log file that cannot be opened is reported and skipped; the process
//! keeps logging to stdout. Metrics go to a Prometheus listener when
//! enabled.

mod logging;
mod metrics;

pub use logging::{LogFileWriter, LogFormat, open_log_file};
pub use metrics::install_prometheus;

use crate::config::AppConfig;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Observability settings.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: String,
    /// Stdout and file format.
    pub format: LogFormat,
    /// Log file, if any.
    pub file: Option<PathBuf>,
    /// Prometheus listener port, if metrics are enabled.
    pub metrics_port: Option<u16>,
}

impl ObservabilityConfig {
    /// Derives observability settings from application config.
    ///
    /// `verbose` forces debug level.
    #[must_use]
    pub fn from_app_config(config: &AppConfig, verbose: bool) -> Self {
        Self {
            level: if verbose {
                "debug".to_string()
            } else {
                config.log.level.clone()
            },
            format: config.log.format,
            file: config.log.path.clone(),
            metrics_port: config.metrics.enabled.then_some(config.metrics.port),
        }
    }
}

/// Handle to running observability components.
pub struct ObservabilityHandle {
    metrics: Option<PrometheusHandle>,
    log_file: Option<PathBuf>,
}

impl ObservabilityHandle {
    /// Returns the Prometheus handle, if metrics were enabled.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }

    /// Returns the log file actually in use.
    #[must_use]
    pub fn log_file(&self) -> Option<&std::path::Path> {
        self.log_file.as_deref()
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber and, when enabled, the metrics exporter.
///
/// # Errors
///
/// Returns an error if observability was already initialized or the
/// metrics exporter cannot be installed.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let filter = build_filter(&config.level);

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.format)];
    let mut file_error = None;
    let mut log_file = None;
    if let Some(path) = &config.file {
        match open_log_file(path) {
            Ok(writer) => {
                layers.push(file_layer(config.format, writer));
                log_file = Some(path.clone());
            },
            Err(e) => file_error = Some(e),
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(init_error)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })?;

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "Log file unavailable, logging to stdout only");
    }

    let metrics = config.metrics_port.map(install_prometheus).transpose()?;

    Ok(ObservabilityHandle { metrics, log_file })
}

/// Builds the level filter. `RUST_LOG` wins over `level`; an unparseable
/// level falls back to `info`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.trim().to_ascii_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, writer: LogFileWriter) -> BoxedLayer {
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .boxed(),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        let mut app = AppConfig::default();
        app.metrics.enabled = true;

        let config = ObservabilityConfig::from_app_config(&app, true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.metrics_port, Some(9090));
        assert_eq!(config.file, Some(PathBuf::from("bot.log")));

        let quiet = ObservabilityConfig::from_app_config(&AppConfig::default(), false);
        assert_eq!(quiet.level, "INFO");
        assert_eq!(quiet.metrics_port, None);
    }
}
