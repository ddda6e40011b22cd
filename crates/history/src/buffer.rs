//! Fixed-capacity reading window.
//!
//! Backed by a `HeapRb` ring; a full ring overwrites its oldest slot, so an
//! append is a single O(1) push under the lock.

use std::fmt;

use contracts::Reading;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use tracing::trace;

/// Recent readings, oldest first
///
/// Single writer (the ingestion coordinator), any number of snapshot
/// readers. Appends and snapshots serialize on one short lock, so a
/// snapshot always sees either all or none of an append.
pub struct HistoryBuffer {
    ring: Mutex<HeapRb<Reading>>,
    capacity: usize,
}

impl fmt::Debug for HistoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl HistoryBuffer {
    /// Create an empty buffer
    ///
    /// # Panics
    /// Panics if `capacity` is zero; configuration validation rejects it.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            ring: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    /// Append a reading at the tail, evicting the head when full
    pub fn append(&self, reading: Reading) {
        let mut ring = self.ring.lock();
        if let Some(evicted) = ring.push_overwrite(reading) {
            trace!(timestamp = %evicted.timestamp, "evicted oldest reading");
        }
        debug_assert!(
            ring.occupied_len() <= self.capacity,
            "history buffer exceeded its capacity"
        );
    }

    /// Ordered copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<Reading> {
        self.ring.lock().iter().cloned().collect()
    }

    /// Current number of readings
    pub fn len(&self) -> usize {
        self.ring.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn make_reading(temperature: f64) -> Reading {
        Reading::new("IOT-test", temperature, 50.0, Utc::now())
    }

    fn temperatures(readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(|r| r.temperature).collect()
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let history = HistoryBuffer::new(5);
        for t in [21.0, 22.0, 23.0] {
            history.append(make_reading(t));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(temperatures(&history.snapshot()), vec![21.0, 22.0, 23.0]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let history = HistoryBuffer::new(3);
        for t in [21.0, 22.0, 23.0, 24.0] {
            history.append(make_reading(t));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(temperatures(&history.snapshot()), vec![22.0, 23.0, 24.0]);
    }

    #[test]
    fn test_long_sequence_keeps_last_capacity() {
        let capacity = 7;
        let history = HistoryBuffer::new(capacity);
        let total = 100;
        for i in 0..total {
            history.append(make_reading(i as f64));
            assert!(history.len() <= capacity);
        }

        let expected: Vec<f64> = ((total - capacity)..total).map(|i| i as f64).collect();
        assert_eq!(temperatures(&history.snapshot()), expected);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let history = HistoryBuffer::new(2);
        history.append(make_reading(1.0));
        let snapshot = history.snapshot();
        history.append(make_reading(2.0));
        history.append(make_reading(3.0));

        assert_eq!(temperatures(&snapshot), vec![1.0]);
    }

    #[test]
    fn test_empty_snapshot() {
        let history = HistoryBuffer::new(4);
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
        assert_eq!(history.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_rejected() {
        let _ = HistoryBuffer::new(0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_snapshots_never_torn() {
        let history = Arc::new(HistoryBuffer::new(8));

        let writer = {
            let history = Arc::clone(&history);
            tokio::spawn(async move {
                for i in 0..2_000 {
                    history.append(make_reading(i as f64));
                    if i % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..3 {
            let history = Arc::clone(&history);
            readers.push(tokio::spawn(async move {
                for _ in 0..500 {
                    let temps = temperatures(&history.snapshot());
                    assert!(temps.len() <= 8);
                    // consecutive arrivals stay consecutive
                    for pair in temps.windows(2) {
                        assert_eq!(pair[1] - pair[0], 1.0);
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
