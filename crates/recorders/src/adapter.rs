//! SinkAdapter - bounds and contains one recorder

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ContractError, Reading, RecordingSink, SinkKind, SinkOutcome};
use metrics::counter;
use tracing::{debug, error, instrument, warn};

use crate::metrics::SinkMetrics;

/// Uniform wrapper around one external recorder
///
/// `record` never fails and never outlives the adapter's time budget:
/// rejections, transport errors and timeouts all come back as a failed
/// `SinkOutcome`.
pub struct SinkAdapter<S> {
    /// Sink name
    name: String,
    /// Recorder kind
    kind: SinkKind,
    /// Wrapped recorder
    sink: S,
    /// Per-call time budget
    timeout: Duration,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
}

impl<S: RecordingSink> SinkAdapter<S> {
    /// Wrap a recorder with the given time budget
    pub fn new(sink: S, timeout: Duration) -> Self {
        let metrics = Arc::new(SinkMetrics::new());
        metrics.set_connected(sink.is_connected());

        Self {
            name: sink.name().to_string(),
            kind: sink.kind(),
            sink,
            timeout,
            metrics,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Wrapped recorder
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether the recorder is connected right now
    pub fn is_connected(&self) -> bool {
        let connected = self.sink.is_connected();
        self.metrics.set_connected(connected);
        connected
    }

    /// Record one reading within the time budget
    #[instrument(
        name = "sink_adapter_record",
        skip(self, reading),
        fields(sink = %self.name, kind = %self.kind)
    )]
    pub async fn record(&mut self, reading: &Reading) -> SinkOutcome {
        self.metrics.inc_attempt_count();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.sink.record(reading)).await {
            Ok(Ok(receipt)) => {
                self.metrics.inc_success_count();
                debug!(sink = %self.name, correlation_id = %receipt.correlation_id, "Recorded");
                SinkOutcome::succeeded(self.kind, receipt)
            }
            Ok(Err(e)) => {
                self.metrics.inc_failure_count();
                if e.is_sink_error() {
                    warn!(sink = %self.name, error = %e, "Record failed");
                } else {
                    error!(sink = %self.name, error = %e, "Reading rejected before send");
                }
                SinkOutcome::failed(self.kind, e.to_string())
            }
            Err(_) => {
                self.metrics.inc_timeout_count();
                counter!("sensor_relay_sink_timeouts_total", "sink" => self.kind.as_str())
                    .increment(1);
                let e = ContractError::sink_timeout(&self.name, duration_ms(self.timeout));
                warn!(sink = %self.name, error = %e, "Record timed out");
                SinkOutcome::failed(self.kind, e.to_string())
            }
        };

        self.metrics.set_last_latency(started.elapsed());
        outcome
    }

    /// Close the recorder, logging failures
    #[instrument(name = "sink_adapter_close", skip(self), fields(sink = %self.name))]
    pub async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            error!(sink = %self.name, error = %e, "Close failed on shutdown");
        }
        self.metrics.set_connected(false);
        debug!(sink = %self.name, "SinkAdapter closed");
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{MockBehavior, MockSink};
    use chrono::Utc;

    fn reading() -> Reading {
        Reading::new("IOT-test", 24.0, 45.0, Utc::now())
    }

    #[tokio::test]
    async fn test_adapter_success() {
        let mut adapter = SinkAdapter::new(
            MockSink::ledger(MockBehavior::Succeed),
            Duration::from_millis(200),
        );

        let outcome = adapter.record(&reading()).await;
        assert!(outcome.success);
        assert_eq!(outcome.sink, SinkKind::Ledger);
        assert!(outcome.correlation_id.is_some());
        assert_eq!(adapter.metrics().success_count(), 1);
    }

    #[tokio::test]
    async fn test_adapter_failure_is_data() {
        let mut adapter = SinkAdapter::new(
            MockSink::streaming(MockBehavior::Fail("refused".into())),
            Duration::from_millis(200),
        );

        let outcome = adapter.record(&reading()).await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("refused"));
        assert_eq!(adapter.metrics().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_adapter_timeout_bounded() {
        let timeout = Duration::from_millis(50);
        let mut adapter = SinkAdapter::new(MockSink::ledger(MockBehavior::Hang), timeout);

        let started = Instant::now();
        let outcome = adapter.record(&reading()).await;
        let elapsed = started.elapsed();

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("timed out after 50ms"));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(500));
        assert_eq!(adapter.metrics().timeout_count(), 1);
    }

    #[tokio::test]
    async fn test_adapter_close_marks_disconnected() {
        let mut adapter = SinkAdapter::new(
            MockSink::streaming(MockBehavior::Succeed),
            Duration::from_millis(50),
        );
        assert!(adapter.metrics().is_connected());

        adapter.close().await;
        assert!(!adapter.metrics().is_connected());
        assert!(!adapter.is_connected());
    }
}
