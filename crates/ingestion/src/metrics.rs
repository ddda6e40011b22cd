//! Ingestion counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Readings produced by the source task
    readings_generated: AtomicU64,

    /// Readings refused or evicted by the drop policy
    readings_dropped: AtomicU64,

    /// Readings fully processed and broadcast
    readings_processed: AtomicU64,

    /// Manual triggers served
    triggers: AtomicU64,

    /// Current work queue length
    queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generated(&self) {
        self.readings_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.readings_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn readings_processed(&self) -> u64 {
        self.readings_processed.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            readings_generated: self.readings_generated.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
            readings_processed: self.readings_processed.load(Ordering::Relaxed),
            triggers: self.triggers.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSnapshot {
    pub readings_generated: u64,
    pub readings_dropped: u64,
    pub readings_processed: u64,
    pub triggers: u64,
    pub queue_len: usize,
}
