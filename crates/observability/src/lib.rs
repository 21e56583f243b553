//! # Observability
//!
//! Tracing + Prometheus metrics for DAQ applications.
//!
//! - Tracing initialisation (JSON / Pretty / Compact)
//! - Prometheus exporter
//! - Queue depth sampling and run summary
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig::default())?;
//!
//! let mut sampler = QueueDepthAggregator::new();
//! sampler.update(&coordinator.queue_summaries());
//! println!("{}", sampler.summary());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_queue_summaries, DepthStats, QueueDepthAggregator, QueueDepthSummary, RunSummary,
};

/// Initialise with defaults (JSON logs, metrics on port 9000)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Used when `RUST_LOG` is not set
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(9000),
            default_log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

/// Initialise tracing (to stderr) and, if a port is given, the Prometheus exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_thread_names(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_thread_names(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// Install only the Prometheus recorder, for when tracing is set up elsewhere
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
