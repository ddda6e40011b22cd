//! Ingestion Coordinator - one reading at a time through history, both
//! recorders and the broadcaster

use std::sync::Arc;
use std::time::Instant;

use async_channel::Receiver;
use broadcaster::Broadcaster;
use contracts::{CompositeEvent, Reading, RecordingSink, SinkKind, SinkOutcome};
use history::HistoryBuffer;
use observability::{RelayMetricsAggregator, RelaySummary};
use recorders::{MetricsSnapshot, SinkAdapter, SinkMetrics};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::metrics::IngestionMetrics;
use crate::queue::IngestCommand;

/// What the coordinator hands back when its queue is drained
#[derive(Debug, Clone, Default)]
pub struct CoordinatorReport {
    /// Readings fully processed
    pub processed: u64,
    /// Ledger adapter counters, if the ledger was configured
    pub ledger: Option<MetricsSnapshot>,
    /// Streaming adapter counters, if streaming was enabled
    pub streaming: Option<MetricsSnapshot>,
    /// Aggregated outcomes and latencies
    pub summary: RelaySummary,
}

/// The orchestration core
///
/// Strictly sequential across readings, parallel across the two recorders
/// within a reading: events reach the broadcaster in arrival order.
pub struct IngestionCoordinator<L, S> {
    history: Arc<HistoryBuffer>,
    ledger: Option<SinkAdapter<L>>,
    streaming: Option<SinkAdapter<S>>,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<IngestionMetrics>,
    aggregator: RelayMetricsAggregator,
}

impl<L: RecordingSink, S: RecordingSink> IngestionCoordinator<L, S> {
    /// Create a coordinator with no recorders attached
    pub fn new(
        history: Arc<HistoryBuffer>,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            history,
            ledger: None,
            streaming: None,
            broadcaster,
            metrics,
            aggregator: RelayMetricsAggregator::new(),
        }
    }

    /// Attach the ledger recorder (`None` = not configured)
    pub fn with_ledger(mut self, ledger: Option<SinkAdapter<L>>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Attach the streaming recorder (`None` = not enabled)
    pub fn with_streaming(mut self, streaming: Option<SinkAdapter<S>>) -> Self {
        self.streaming = streaming;
        self
    }

    /// Shared counters of an attached recorder
    pub fn sink_metrics(&self, kind: SinkKind) -> Option<Arc<SinkMetrics>> {
        match kind {
            SinkKind::Ledger => self.ledger.as_ref().map(|a| Arc::clone(a.metrics())),
            SinkKind::Streaming => self.streaming.as_ref().map(|a| Arc::clone(a.metrics())),
        }
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Run one reading through the full pipeline
    ///
    /// Never fails: recorder problems come back inside the event, and an
    /// unconfigured or disconnected recorder is skipped with an absent
    /// outcome.
    #[instrument(
        name = "coordinator_process",
        skip(self, reading),
        fields(device_id = %reading.device_id)
    )]
    pub async fn process(&mut self, reading: Reading) -> CompositeEvent {
        let started = Instant::now();

        self.history.append(reading.clone());
        observability::record_history_len(self.history.len());

        let (ledger, streaming) = tokio::join!(
            record_on(self.ledger.as_mut(), &reading),
            record_on(self.streaming.as_mut(), &reading),
        );

        let event = CompositeEvent::new(reading, ledger, streaming);

        match self.broadcaster.broadcast(&event) {
            Ok(report) => {
                observability::record_broadcast(report.delivered, report.dropped, report.removed);
                debug!(
                    delivered = report.delivered,
                    dropped = report.dropped,
                    removed = report.removed,
                    "Event broadcast"
                );
            }
            Err(e) => error!(error = %e, "Event broadcast failed"),
        }
        observability::record_observers(self.broadcaster.observer_count());

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_event(&event);
        observability::record_ingest_latency_ms(latency_ms);
        self.aggregator.update(&event, latency_ms);
        self.metrics.record_processed();

        event
    }

    /// Consume the work queue until it is closed and drained, then close
    /// both recorders
    #[instrument(name = "coordinator_run", skip(self, rx))]
    pub async fn run(mut self, rx: Receiver<IngestCommand>) -> CoordinatorReport {
        info!(
            ledger = self.ledger.is_some(),
            streaming = self.streaming.is_some(),
            "Ingestion coordinator started"
        );

        while let Ok(command) = rx.recv().await {
            self.metrics.update_queue_len(rx.len());
            match command {
                IngestCommand::Reading(reading) => {
                    self.process(reading).await;
                }
                IngestCommand::Trigger { reading, reply } => {
                    let event = self.process(reading).await;
                    if reply.send(event).is_err() {
                        debug!("Trigger requester went away before the reply");
                    }
                }
            }
        }

        info!(
            processed = self.metrics.readings_processed(),
            "Work queue closed, shutting down recorders"
        );
        self.shutdown().await
    }

    async fn shutdown(mut self) -> CoordinatorReport {
        if let Some(adapter) = self.ledger.as_mut() {
            adapter.close().await;
        }
        if let Some(adapter) = self.streaming.as_mut() {
            adapter.close().await;
        }

        CoordinatorReport {
            processed: self.metrics.readings_processed(),
            ledger: self.ledger.as_ref().map(|a| a.metrics().snapshot()),
            streaming: self.streaming.as_ref().map(|a| a.metrics().snapshot()),
            summary: self.aggregator.summary(),
        }
    }
}

impl<L, S> IngestionCoordinator<L, S>
where
    L: RecordingSink + Send + 'static,
    S: RecordingSink + Send + 'static,
{
    /// Spawn the coordinator as a background task
    pub fn spawn(self, rx: Receiver<IngestCommand>) -> JoinHandle<CoordinatorReport> {
        tokio::spawn(self.run(rx))
    }
}

/// Record on one adapter, or report it absent
async fn record_on<T: RecordingSink>(
    adapter: Option<&mut SinkAdapter<T>>,
    reading: &Reading,
) -> Option<SinkOutcome> {
    let adapter = adapter.filter(|a| a.is_connected())?;
    let kind = adapter.kind();
    let started = Instant::now();
    let outcome = adapter.record(reading).await;
    observability::record_sink_latency_ms(kind, started.elapsed().as_secs_f64() * 1000.0);
    Some(outcome)
}
