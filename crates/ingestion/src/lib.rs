//! # Ingestion
//!
//! Reading source, work queue and the Ingestion Coordinator.
//!
//! Responsibilities:
//! - Produce readings on a fixed cadence (`SourceTask` over a `ReadingSource`)
//! - Queue them with an explicit backpressure policy
//! - Run each reading through history, both recorders and the broadcaster
//! - Serve manual triggers through the same queue
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{work_queue, IngestionCoordinator, SourceTask};
//!
//! let (tx, rx) = work_queue(16);
//! let coordinator = IngestionCoordinator::new(history, broadcaster, metrics.clone())
//!     .with_ledger(ledger)
//!     .with_streaming(streaming)
//!     .spawn(rx);
//! let source = SourceTask::new(device, interval, DropPolicy::Block, tx, metrics)
//!     .spawn(cancel.clone());
//! ```

mod coordinator;
mod error;
mod metrics;
mod queue;
mod simulator;
mod source;

pub use contracts::{CompositeEvent, DropPolicy, Reading, ReadingSource};
pub use coordinator::{CoordinatorReport, IngestionCoordinator};
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, IngestionSnapshot};
pub use queue::{enqueue_reading, work_queue, EnqueueOutcome, IngestCommand, IngestHandle};
pub use simulator::{generate_device_id, DeviceSimulator};
pub use source::SourceTask;
