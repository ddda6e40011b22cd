//! Sink metrics for observability

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Recorder currently connected
    connected: AtomicBool,
    /// Total record attempts
    attempt_count: AtomicU64,
    /// Total successful records
    success_count: AtomicU64,
    /// Total recorder failures
    failure_count: AtomicU64,
    /// Total calls cut off by the time budget
    timeout_count: AtomicU64,
    /// Latency of the last attempt (microseconds)
    last_latency_us: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn attempt_count(&self) -> u64 {
        self.attempt_count.load(Ordering::Relaxed)
    }

    pub fn inc_attempt_count(&self) {
        self.attempt_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn inc_success_count(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeout_count(&self) -> u64 {
        self.timeout_count.load(Ordering::Relaxed)
    }

    pub fn inc_timeout_count(&self) {
        self.timeout_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_latency(&self) -> Duration {
        Duration::from_micros(self.last_latency_us.load(Ordering::Relaxed))
    }

    pub fn set_last_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.last_latency_us.store(micros, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connected: self.is_connected(),
            attempt_count: self.attempt_count(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            timeout_count: self.timeout_count(),
            last_latency: self.last_latency(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub connected: bool,
    pub attempt_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub timeout_count: u64,
    pub last_latency: Duration,
}
