//! Logging and metrics setup.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogFormat};
use crate::error::AppError;

/// Installs the global tracing subscriber.
pub fn init_tracing(config: &Config) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| AppError::Telemetry(format!("invalid log filter: {e}")))?;
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
        .map_err(|e| AppError::Telemetry(e.to_string()))
}

/// Installs the Prometheus metrics recorder.
///
/// With `METRICS_ADDR` set, the exporter serves scrapes on that address and
/// no handle is returned. Otherwise the handle lets the caller render the
/// metrics itself. Must be called from within a Tokio runtime.
pub fn install_metrics(config: &Config) -> Result<Option<PrometheusHandle>, AppError> {
    let builder = PrometheusBuilder::new();

    match config.metrics_addr {
        Some(addr) => {
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| AppError::Telemetry(e.to_string()))?;
            tracing::info!(%addr, "serving Prometheus metrics");
            Ok(None)
        }
        None => builder
            .install_recorder()
            .map(Some)
            .map_err(|e| AppError::Telemetry(e.to_string())),
    }
}
