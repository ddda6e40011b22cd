//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: the reading and
//! event data model, the observer wire messages, the recorder and source
//! traits, and the configuration schema.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock UTC (`chrono::DateTime<Utc>`) is the only clock
//! - On the wire every instant is ISO-8601 with millisecond precision (`...Z`)

mod blueprint;
mod error;
mod event;
mod outcome;
mod reading;
mod reading_source;
mod sink;
pub mod timestamp;

pub use blueprint::*;
pub use error::*;
pub use event::{CompositeEvent, HistoryMessage};
pub use outcome::{Receipt, SinkKind, SinkOutcome};
pub use reading::{Reading, UNIT_HUMIDITY, UNIT_TEMPERATURE};
pub use reading_source::ReadingSource;
pub use sink::*;
