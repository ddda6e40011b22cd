//! Broadcaster - owns the ObserverSet

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{CompositeEvent, HistoryMessage};
use history::HistoryBuffer;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::error::BroadcastError;
use crate::metrics::BroadcastMetrics;
use crate::observer::{Frame, ObserverId, ObserverState, StateCell, Subscription};

struct ObserverSlot {
    tx: mpsc::Sender<Frame>,
    state: StateCell,
}

/// Result of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Observers the frame was queued for
    pub delivered: usize,
    /// Observers whose queue was full; the frame was skipped for them
    pub dropped: usize,
    /// Observers removed because their channel was closed
    pub removed: usize,
}

/// Fan-out of composite events to connected observers
///
/// Connect snapshots the history window and registers the observer under
/// one write lock, and broadcasts run under the read lock, so every reading
/// reaches a new observer either through its backfill or through a later
/// broadcast. A reading appended just before connect may arrive through
/// both.
pub struct Broadcaster {
    history: Arc<HistoryBuffer>,
    observers: RwLock<HashMap<ObserverId, ObserverSlot>>,
    next_id: AtomicU64,
    queue_capacity: usize,
    closed: AtomicBool,
    metrics: Arc<BroadcastMetrics>,
}

impl Broadcaster {
    /// Create a broadcaster backed by the given history window
    ///
    /// `queue_capacity` bounds each observer's outbound queue (min 1).
    pub fn new(history: Arc<HistoryBuffer>, queue_capacity: usize) -> Self {
        Self {
            history,
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
            closed: AtomicBool::new(false),
            metrics: Arc::new(BroadcastMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<BroadcastMetrics> {
        &self.metrics
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register an observer and queue its history backfill
    ///
    /// # Errors
    /// - The broadcaster is closed
    /// - The backfill could not be serialized
    #[instrument(name = "broadcaster_connect", skip(self))]
    pub fn connect(&self) -> Result<Subscription, BroadcastError> {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let state = StateCell::new();

        let mut observers = self.observers.write();
        if self.is_closed() {
            return Err(BroadcastError::Closed);
        }

        let backfill = HistoryMessage::new(self.history.snapshot());
        let entries = backfill.data.len();
        let frame: Frame = serde_json::to_string(&backfill)?.into();

        // Fresh queue with capacity >= 1, cannot be full
        if tx.try_send(frame).is_err() {
            warn!(observer = %id, "History backfill could not be queued");
        }

        state.transition(ObserverState::Connected);
        observers.insert(
            id,
            ObserverSlot {
                tx,
                state: state.clone(),
            },
        );
        let count = observers.len();
        drop(observers);

        self.metrics.inc_connected();
        info!(observer = %id, history = entries, observers = count, "Observer connected");

        Ok(Subscription::new(id, rx, state))
    }

    /// Remove an observer; unknown or already-removed ids are ignored
    pub fn disconnect(&self, id: ObserverId) {
        let removed = self.observers.write().remove(&id);
        if let Some(slot) = removed {
            slot.state.transition(ObserverState::Disconnected);
            self.metrics.inc_disconnected();
            info!(observer = %id, observers = self.observer_count(), "Observer disconnected");
        }
    }

    /// Send one composite event to every connected observer
    ///
    /// Never waits on an observer. A full queue skips the frame for that
    /// observer only; a closed queue removes the observer. With no
    /// observers this is a no-op.
    ///
    /// # Errors
    /// The event could not be serialized.
    #[instrument(name = "broadcaster_broadcast", skip(self, event))]
    pub fn broadcast(&self, event: &CompositeEvent) -> Result<BroadcastReport, BroadcastError> {
        let frame: Frame = serde_json::to_string(event)?.into();
        Ok(self.broadcast_frame(frame))
    }

    fn broadcast_frame(&self, frame: Frame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        {
            let observers = self.observers.read();
            for (id, slot) in observers.iter() {
                match slot.tx.try_send(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        report.dropped += 1;
                        debug!(observer = %id, "Observer queue full, frame dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut observers = self.observers.write();
            for id in &closed {
                if let Some(slot) = observers.remove(id) {
                    slot.state.transition(ObserverState::Disconnected);
                    debug!(observer = %id, "Observer channel closed, removed");
                }
            }
            report.removed = closed.len();
        }

        self.metrics.inc_events_broadcast();
        self.metrics.add_frames_delivered(report.delivered as u64);
        self.metrics.add_frames_dropped(report.dropped as u64);
        self.metrics.add_observers_removed(report.removed as u64);

        report
    }

    /// Stop accepting observers and drop every connection
    ///
    /// Frames already queued are still delivered; each subscription then
    /// ends.
    #[instrument(name = "broadcaster_close_all", skip(self))]
    pub fn close_all(&self) {
        let drained: Vec<_> = {
            let mut observers = self.observers.write();
            self.closed.store(true, Ordering::SeqCst);
            observers.drain().collect()
        };

        for (_, slot) in &drained {
            slot.state.transition(ObserverState::Disconnected);
        }
        info!(observers = drained.len(), "All observers closed");
    }
}
