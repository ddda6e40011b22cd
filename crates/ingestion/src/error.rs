//! Ingestion error types

use thiserror::Error;

/// Ingestion error
///
/// Recorder failures never show up here; they travel inside the
/// `CompositeEvent` as failed outcomes.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Work queue closed, the pipeline is shutting down
    #[error("ingestion queue closed")]
    QueueClosed,

    /// Coordinator stopped before answering a manual trigger
    #[error("coordinator dropped trigger for device {device_id}")]
    TriggerDropped {
        /// Device ID
        device_id: String,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
