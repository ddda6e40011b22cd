//! Pipeline orchestrator - wires the relay together and owns its lifecycle.
//!
//! Startup order: recorders, coordinator, HTTP server, then the source.
//! Shutdown runs in reverse so every queued reading is still processed
//! and broadcast before observers are closed.

use std::future::{pending, Future};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use broadcaster::Broadcaster;
use contracts::{ReadingSource, RelayBlueprint};
use history::HistoryBuffer;
use ingestion::{
    work_queue, DeviceSimulator, IngestHandle, IngestionCoordinator, IngestionMetrics, SourceTask,
};
use recorders::{create_ledger_adapter, create_streaming_adapter};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::RelayStats;
use crate::server::{self, RelayContext, StreamingStatus};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The relay blueprint configuration
    pub blueprint: RelayBlueprint,

    /// Maximum number of periodic readings (None = unlimited)
    pub max_readings: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the relay until `shutdown` resolves, the timeout expires or the
    /// source reaches its reading limit
    #[instrument(name = "pipeline_run", skip(self, shutdown))]
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RelayStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let device = DeviceSimulator::from_config(&blueprint.device);
        let device_id = device.device_id().to_string();
        let source: Arc<dyn ReadingSource> = Arc::new(device);

        let history = Arc::new(HistoryBuffer::new(blueprint.history.capacity));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&history),
            blueprint.observers.queue_capacity,
        ));

        let ledger = create_ledger_adapter(blueprint)
            .await
            .context("Failed to create ledger recorder")?;
        let streaming = create_streaming_adapter(&blueprint.streaming, &device_id)
            .await
            .context("Failed to create streaming recorder")?;

        let ledger_metrics = ledger.as_ref().map(|a| Arc::clone(a.metrics()));
        let streaming_status = streaming
            .as_ref()
            .map(|a| StreamingStatus::new(a.sink().device_id(), Arc::clone(a.metrics())));

        info!(
            device_id = %device_id,
            ledger = ledger.is_some(),
            streaming = streaming.is_some(),
            history_capacity = blueprint.history.capacity,
            "Recorders initialized"
        );

        // Coordinator
        let metrics = Arc::new(IngestionMetrics::new());
        let (tx, rx) = work_queue(blueprint.ingestion.queue_capacity);
        let coordinator = IngestionCoordinator::new(
            Arc::clone(&history),
            Arc::clone(&broadcaster),
            Arc::clone(&metrics),
        )
        .with_ledger(ledger)
        .with_streaming(streaming)
        .spawn(rx);

        let ingest = IngestHandle::new(tx.clone(), Arc::clone(&source), Arc::clone(&metrics));
        let context = Arc::new(
            RelayContext::new(Arc::clone(&history), Arc::clone(&broadcaster), ingest.clone())
                .with_ledger(ledger_metrics)
                .with_streaming(streaming_status),
        );

        // Server
        let addr = format!("{}:{}", blueprint.server.host, blueprint.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let server_shutdown = CancellationToken::new();
        let server = tokio::spawn(server::serve(
            listener,
            Arc::clone(&context),
            server_shutdown.clone(),
        ));

        // Source
        let source_cancel = CancellationToken::new();
        let mut source_task = SourceTask::new(
            source,
            blueprint.device.interval(),
            blueprint.ingestion.drop_policy,
            tx,
            Arc::clone(&metrics),
        )
        .with_max_readings(self.config.max_readings)
        .spawn(source_cancel.clone());

        let timeout = async {
            match self.config.timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => pending::<()>().await,
            }
        };

        let finished = tokio::select! {
            _ = shutdown => {
                warn!("Received shutdown signal, stopping relay...");
                None
            }
            _ = timeout => {
                info!("Run timeout reached, stopping relay...");
                None
            }
            produced = &mut source_task => Some(produced),
        };

        // Shutdown: source, queue, coordinator, observers, server
        source_cancel.cancel();
        let produced = match finished {
            Some(produced) => produced,
            None => source_task.await,
        }
        .unwrap_or_else(|e| {
            warn!(error = %e, "Source task failed");
            0
        });
        info!(produced, "Source stopped");

        ingest.close();
        let report = coordinator
            .await
            .context("Ingestion coordinator task failed")?;

        broadcaster.close_all();
        server_shutdown.cancel();
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Relay server error during shutdown"),
            Err(e) => warn!(error = %e, "Relay server task failed"),
        }

        let stats = RelayStats {
            device_id,
            ingestion: metrics.snapshot(),
            broadcast: broadcaster.metrics().snapshot(),
            ledger: report.ledger,
            streaming: report.streaming,
            summary: report.summary,
            duration: start_time.elapsed(),
        };

        info!(
            processed = report.processed,
            duration_secs = stats.duration.as_secs_f64(),
            "Relay stopped"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_readings: Option<u64>, timeout: Option<Duration>) -> PipelineConfig {
        let mut blueprint = RelayBlueprint::default();
        blueprint.server.host = "127.0.0.1".to_string();
        blueprint.server.port = 0;
        blueprint.device.interval_ms = 10;
        blueprint.device.device_id = Some("IOT-pipeline".to_string());

        PipelineConfig {
            blueprint,
            max_readings,
            timeout,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_run_stops_at_max_readings() {
        let stats = Pipeline::new(config(Some(5), Some(Duration::from_secs(10))))
            .run(pending())
            .await
            .unwrap();

        assert_eq!(stats.device_id, "IOT-pipeline");
        assert_eq!(stats.ingestion.readings_generated, 5);
        assert_eq!(stats.ingestion.readings_processed, 5);
        assert_eq!(stats.summary.total_events, 5);
        assert_eq!(stats.summary.ledger.absent, 5);
        assert!(stats.ledger.is_none());

        let streaming = stats.streaming.unwrap();
        assert_eq!(streaming.success_count, 5);
        assert!(!streaming.connected);
    }

    #[tokio::test]
    async fn test_shutdown_signal_drains_queue() {
        let stats = Pipeline::new(config(None, None))
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert!(stats.ingestion.readings_processed >= 1);
        assert!(stats.ingestion.readings_processed <= stats.ingestion.readings_generated);
        assert_eq!(stats.summary.total_events, stats.ingestion.readings_processed);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = config(Some(1), None);
        config.blueprint.server.port = taken.local_addr().unwrap().port();

        let err = Pipeline::new(config).run(pending()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
