//! Prometheus metrics exporter.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Installs the Prometheus recorder with an HTTP listener on `port`.
///
/// Must be called from inside a tokio runtime; the exporter runs as a task
/// on it.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if no runtime is active, the listener
/// cannot be built, or a global recorder is already installed.
pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| Error::OperationFailed {
        operation: "metrics_runtime".to_string(),
        cause: e.to_string(),
    })?;

    let listen_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let (recorder, exporter) = {
        let _guard = runtime.enter();
        PrometheusBuilder::new()
            .with_http_listener(listen_addr)
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "metrics_exporter_build".to_string(),
                cause: e.to_string(),
            })?
    };

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|e| Error::OperationFailed {
        operation: "metrics_recorder_install".to_string(),
        cause: e.to_string(),
    })?;
    runtime.spawn(exporter);

    tracing::info!(addr = %listen_addr, "Prometheus metrics listener started");
    Ok(handle)
}
