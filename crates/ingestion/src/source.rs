//! Scheduled source task - drives a ReadingSource on a fixed cadence

use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use contracts::{DropPolicy, ReadingSource};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::metrics::IngestionMetrics;
use crate::queue::{enqueue_reading, IngestCommand};

/// Periodic producer feeding the work queue
///
/// The first reading is taken immediately, then one per `interval`.
pub struct SourceTask {
    source: Arc<dyn ReadingSource>,
    interval: Duration,
    drop_policy: DropPolicy,
    max_readings: Option<u64>,
    tx: Sender<IngestCommand>,
    metrics: Arc<IngestionMetrics>,
}

impl SourceTask {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        interval: Duration,
        drop_policy: DropPolicy,
        tx: Sender<IngestCommand>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            source,
            interval,
            drop_policy,
            max_readings: None,
            tx,
            metrics,
        }
    }

    /// Stop after producing `n` readings
    pub fn with_max_readings(mut self, n: Option<u64>) -> Self {
        self.max_readings = n;
        self
    }

    /// Spawn the task; it stops on cancellation, on reaching
    /// `max_readings` or when the queue closes
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until stopped, returning the number of readings produced
    #[instrument(
        name = "source_task_run",
        skip(self, cancel),
        fields(device_id = %self.source.device_id(), interval_ms = self.interval.as_millis() as u64)
    )]
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        info!(device_id = %self.source.device_id(), "Device started streaming");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut produced: u64 = 0;

        loop {
            if self.max_readings.is_some_and(|max| produced >= max) {
                debug!(produced, "Reading limit reached");
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reading = self.source.next_reading();
            produced += 1;
            self.metrics.record_generated();

            let enqueued = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = enqueue_reading(&self.tx, reading, self.drop_policy, &self.metrics) => r,
            };
            if let Err(e) = enqueued {
                warn!(error = %e, "Work queue closed, source stopping");
                break;
            }
        }

        info!(device_id = %self.source.device_id(), produced, "Device stopped streaming");
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::work_queue;
    use crate::simulator::DeviceSimulator;

    fn device() -> Arc<dyn ReadingSource> {
        Arc::new(DeviceSimulator::new("IOT-src", [20.0, 30.0], [40.0, 60.0]))
    }

    #[tokio::test]
    async fn test_first_reading_immediate() {
        let (tx, rx) = work_queue(4);
        let task = SourceTask::new(
            device(),
            Duration::from_secs(60),
            DropPolicy::Block,
            tx,
            Arc::new(IngestionMetrics::new()),
        );
        let cancel = CancellationToken::new();
        let handle = task.spawn(cancel.clone());

        let cmd = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("first reading should not wait for the interval")
            .unwrap();
        assert_eq!(cmd.reading().device_id, "IOT-src");

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_max_readings() {
        let (tx, rx) = work_queue(8);
        let metrics = Arc::new(IngestionMetrics::new());
        let produced = SourceTask::new(
            device(),
            Duration::from_millis(5),
            DropPolicy::Block,
            tx,
            Arc::clone(&metrics),
        )
        .with_max_readings(Some(3))
        .run(CancellationToken::new())
        .await;

        assert_eq!(produced, 3);
        assert_eq!(rx.len(), 3);
        assert_eq!(metrics.snapshot().readings_generated, 3);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_full_queue() {
        let (tx, _rx) = work_queue(1);
        let cancel = CancellationToken::new();
        let handle = SourceTask::new(
            device(),
            Duration::from_millis(1),
            DropPolicy::Block,
            tx,
            Arc::new(IngestionMetrics::new()),
        )
        .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let produced = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("source task should stop on cancel")
            .unwrap();
        assert!(produced >= 2);
    }
}
