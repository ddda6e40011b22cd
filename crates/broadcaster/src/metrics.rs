//! Broadcaster counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Fan-out counters, shared with the status endpoint and run summary
#[derive(Debug, Default)]
pub struct BroadcastMetrics {
    connected_total: AtomicU64,
    disconnected_total: AtomicU64,
    events_broadcast: AtomicU64,
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    observers_removed: AtomicU64,
}

impl BroadcastMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_connected(&self) {
        self.connected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_disconnected(&self) {
        self.disconnected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_broadcast(&self) {
        self.events_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_frames_delivered(&self, n: u64) {
        self.frames_delivered.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_frames_dropped(&self, n: u64) {
        self.frames_dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// Observers dropped because their channel was closed or broken
    pub fn add_observers_removed(&self, n: u64) {
        self.observers_removed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn events_broadcast(&self) -> u64 {
        self.events_broadcast.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn observers_removed(&self) -> u64 {
        self.observers_removed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> BroadcastMetricsSnapshot {
        BroadcastMetricsSnapshot {
            connected_total: self.connected_total.load(Ordering::Relaxed),
            disconnected_total: self.disconnected_total.load(Ordering::Relaxed),
            events_broadcast: self.events_broadcast.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            observers_removed: self.observers_removed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `BroadcastMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastMetricsSnapshot {
    pub connected_total: u64,
    pub disconnected_total: u64,
    pub events_broadcast: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub observers_removed: u64,
}
