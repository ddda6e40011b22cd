//! # Recorders
//!
//! Sink Adapter and the external recorders behind it.
//!
//! Responsibilities:
//! - Wrap each recorder behind one `record(reading) -> SinkOutcome` contract
//! - Bound every call by the adapter's time budget
//! - Turn every recorder failure into data, never into a caller error

pub mod adapter;
pub mod builder;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use adapter::SinkAdapter;
pub use builder::{create_ledger_adapter, create_streaming_adapter};
pub use contracts::{RecordingSink, SinkKind, SinkOutcome};
pub use error::RecorderError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{LedgerSink, MockBehavior, MockSink, StreamingSink};
