//! Shared state behind the HTTP and WebSocket handlers

use std::sync::Arc;

use broadcaster::Broadcaster;
use history::HistoryBuffer;
use ingestion::IngestHandle;
use recorders::SinkMetrics;
use serde::Serialize;

/// Handler state
pub type AppState = Arc<RelayContext>;

/// Streaming recorder identity and counters, as reported by `/health`
#[derive(Debug, Clone)]
pub struct StreamingStatus {
    pub device_id: String,
    pub metrics: Arc<SinkMetrics>,
}

impl StreamingStatus {
    pub fn new(device_id: impl Into<String>, metrics: Arc<SinkMetrics>) -> Self {
        Self {
            device_id: device_id.into(),
            metrics,
        }
    }
}

/// Process-wide context: history, observers, the trigger handle and the
/// recorder status the server exposes
pub struct RelayContext {
    pub history: Arc<HistoryBuffer>,
    pub broadcaster: Arc<Broadcaster>,
    pub ingest: IngestHandle,
    ledger: Option<Arc<SinkMetrics>>,
    streaming: Option<StreamingStatus>,
}

impl RelayContext {
    pub fn new(
        history: Arc<HistoryBuffer>,
        broadcaster: Arc<Broadcaster>,
        ingest: IngestHandle,
    ) -> Self {
        Self {
            history,
            broadcaster,
            ingest,
            ledger: None,
            streaming: None,
        }
    }

    /// Ledger recorder counters (`None` = not configured)
    pub fn with_ledger(mut self, ledger: Option<Arc<SinkMetrics>>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Streaming recorder status (`None` = not enabled)
    pub fn with_streaming(mut self, streaming: Option<StreamingStatus>) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn health(&self) -> HealthReport {
        let ledger = match &self.ledger {
            Some(metrics) if metrics.is_connected() => "connected",
            _ => "not configured",
        };

        let streaming = StreamingHealth {
            connected: self
                .streaming
                .as_ref()
                .is_some_and(|s| s.metrics.is_connected()),
            device_id: self.streaming.as_ref().map(|s| s.device_id.clone()),
        };

        HealthReport {
            status: "ok",
            services: ServicesHealth {
                ledger,
                streaming,
                device: DeviceHealth {
                    device_id: self.ingest.device_id().to_string(),
                    streaming: !self.ingest.is_closed(),
                },
            },
            observers: self.broadcaster.observer_count(),
            history: self.history.len(),
        }
    }
}

/// `GET /health` body
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub services: ServicesHealth,
    pub observers: usize,
    pub history: usize,
}

#[derive(Debug, Serialize)]
pub struct ServicesHealth {
    #[serde(rename = "hedera")]
    pub ledger: &'static str,
    #[serde(rename = "neuron")]
    pub streaming: StreamingHealth,
    #[serde(rename = "iot")]
    pub device: DeviceHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingHealth {
    pub connected: bool,
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHealth {
    pub device_id: String,
    /// The source is still feeding the work queue
    pub streaming: bool,
}
