//! Bounded work queue between the source task, manual triggers and the
//! coordinator

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{CompositeEvent, DropPolicy, Reading, ReadingSource};
use tokio::sync::oneshot;
use tracing::{instrument, trace, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;

/// One unit of work for the coordinator
#[derive(Debug)]
pub enum IngestCommand {
    /// Periodic reading from the source task
    Reading(Reading),
    /// Manual trigger; the finished event is sent back
    Trigger {
        reading: Reading,
        reply: oneshot::Sender<CompositeEvent>,
    },
}

impl IngestCommand {
    pub fn reading(&self) -> &Reading {
        match self {
            IngestCommand::Reading(reading) => reading,
            IngestCommand::Trigger { reading, .. } => reading,
        }
    }
}

/// Create the work queue
///
/// A capacity of zero is raised to one.
pub fn work_queue(capacity: usize) -> (Sender<IngestCommand>, Receiver<IngestCommand>) {
    bounded(capacity.max(1))
}

/// What happened to a periodic reading on enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Queued
    Queued,
    /// Queue full, this reading was discarded
    DroppedNewest,
    /// Queue full, the oldest queued command was evicted for this one
    DroppedOldest,
}

/// Enqueue a periodic reading according to the drop policy
///
/// # Errors
/// The queue is closed.
pub async fn enqueue_reading(
    tx: &Sender<IngestCommand>,
    reading: Reading,
    policy: DropPolicy,
    metrics: &IngestionMetrics,
) -> Result<EnqueueOutcome> {
    let command = IngestCommand::Reading(reading);
    let outcome = match policy {
        DropPolicy::Block => {
            tx.send(command)
                .await
                .map_err(|_| IngestionError::QueueClosed)?;
            EnqueueOutcome::Queued
        }
        DropPolicy::DropNewest => match tx.try_send(command) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(_)) => {
                metrics.record_dropped();
                trace!("reading dropped (newest)");
                EnqueueOutcome::DroppedNewest
            }
            Err(TrySendError::Closed(_)) => return Err(IngestionError::QueueClosed),
        },
        DropPolicy::DropOldest => match tx.force_send(command) {
            Ok(None) => EnqueueOutcome::Queued,
            Ok(Some(evicted)) => {
                metrics.record_dropped();
                if let IngestCommand::Trigger { .. } = evicted {
                    warn!("manual trigger evicted from full queue");
                }
                trace!("reading dropped (oldest)");
                EnqueueOutcome::DroppedOldest
            }
            Err(_) => return Err(IngestionError::QueueClosed),
        },
    };

    metrics.update_queue_len(tx.len());
    if outcome != EnqueueOutcome::Queued {
        observability::record_reading_dropped(policy_label(policy));
    }
    Ok(outcome)
}

fn policy_label(policy: DropPolicy) -> &'static str {
    match policy {
        DropPolicy::Block => "block",
        DropPolicy::DropNewest => "drop_newest",
        DropPolicy::DropOldest => "drop_oldest",
    }
}

/// Manual-trigger entry point into the pipeline
///
/// Cloneable; every trigger takes one reading from the shared source and
/// runs it through the same queue as periodic readings.
#[derive(Clone)]
pub struct IngestHandle {
    tx: Sender<IngestCommand>,
    source: Arc<dyn ReadingSource>,
    metrics: Arc<IngestionMetrics>,
}

impl IngestHandle {
    pub fn new(
        tx: Sender<IngestCommand>,
        source: Arc<dyn ReadingSource>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            tx,
            source,
            metrics,
        }
    }

    pub fn device_id(&self) -> &str {
        self.source.device_id()
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Run one full ingestion cycle and wait for its composite event
    ///
    /// Waits for queue room regardless of drop policy.
    ///
    /// # Errors
    /// - The queue is closed
    /// - The coordinator stopped before finishing this reading
    #[instrument(name = "ingest_handle_trigger", skip(self), fields(device_id = %self.device_id()))]
    pub async fn trigger(&self) -> Result<CompositeEvent> {
        let (reply, done) = oneshot::channel();
        let reading = self.source.next_reading();

        self.tx
            .send(IngestCommand::Trigger { reading, reply })
            .await
            .map_err(|_| IngestionError::QueueClosed)?;
        self.metrics.record_trigger();

        done.await.map_err(|_| IngestionError::TriggerDropped {
            device_id: self.device_id().to_string(),
        })
    }

    /// Close the queue; queued commands are still processed
    pub fn close(&self) -> bool {
        self.tx.close()
    }
}
