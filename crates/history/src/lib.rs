//! # History
//!
//! Bounded recent-history window for late-joining observers.
//!
//! Responsibilities:
//! - Keep the `capacity` most recent readings in arrival order
//! - Evict oldest-first on overflow
//! - Hand out immutable snapshots that never observe a torn append
//!
//! ## Usage Example
//!
//! ```ignore
//! use history::HistoryBuffer;
//!
//! let history = HistoryBuffer::new(50);
//! history.append(reading);
//! let backfill = history.snapshot();
//! ```

mod buffer;

pub use buffer::HistoryBuffer;
pub use contracts::Reading;
