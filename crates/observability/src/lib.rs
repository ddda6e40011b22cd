//! Logging and metrics for the relay.
//!
//! `init_tracing` installs the global subscriber once per process. Metric
//! recording goes through the `metrics` facade, so it costs nothing until
//! `init_metrics_only` installs the Prometheus exporter.
//!
//! ```ignore
//! use observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, "info")?;
//! observability::init_metrics_only(9000)?;
//!
//! let event = coordinator.process(reading).await;
//! observability::record_event(&event);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_broadcast, record_event, record_history_len, record_ingest_latency_ms,
    record_observers, record_reading_dropped, record_sink_latency_ms, RelayMetricsAggregator,
    RelaySummary, RunningStats, SinkTally, StatsSummary,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, with thread and source location
    Json,
    Pretty,
    #[default]
    Compact,
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level`.
pub fn init_tracing(format: LogFormat, default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

/// Install the Prometheus recorder with a scrape listener on `0.0.0.0:port`
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Serving Prometheus metrics");
    Ok(())
}
