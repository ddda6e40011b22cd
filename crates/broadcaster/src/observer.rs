//! Observer identity, lifecycle and the receiving end of its queue

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// One serialized JSON text frame, shared by every observer it goes to
pub type Frame = Arc<str>;

/// Observer identity; a reconnect is a new observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl ObserverId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Observer connection lifecycle
///
/// `Connecting -> Connected -> Disconnected`; `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Registered, history backfill not yet queued
    Connecting,
    /// Receiving broadcasts
    Connected,
    /// Removed from the observer set
    Disconnected,
}

/// Lifecycle shared between the observer set and the subscription
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<Mutex<ObserverState>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(ObserverState::Connecting)))
    }

    pub(crate) fn get(&self) -> ObserverState {
        *self.0.lock()
    }

    /// Move to `next`; returns false if already disconnected
    pub(crate) fn transition(&self, next: ObserverState) -> bool {
        let mut state = self.0.lock();
        if *state == ObserverState::Disconnected {
            return false;
        }
        *state = next;
        true
    }
}

/// Receiving side of one observer
///
/// The first frame is always the history backfill. `recv` yields `None`
/// once the observer has been removed and its queue is drained.
#[derive(Debug)]
pub struct Subscription {
    id: ObserverId,
    rx: mpsc::Receiver<Frame>,
    state: StateCell,
}

impl Subscription {
    pub(crate) fn new(id: ObserverId, rx: mpsc::Receiver<Frame>, state: StateCell) -> Self {
        Self { id, rx, state }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn state(&self) -> ObserverState {
        self.state.get()
    }

    /// Next outbound frame, in broadcast order
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Next frame if one is already queued
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}
