//! ReadingSource trait - device abstraction
//!
//! Decouples the ingestion schedule from how readings are produced, so the
//! simulator and scripted test sources share one interface.

use crate::Reading;

/// Reading source trait
///
/// `next_reading` takes `&self` so the periodic source task and the manual
/// trigger can share one device.
pub trait ReadingSource: Send + Sync {
    /// Device identifier stamped on every reading
    fn device_id(&self) -> &str;

    /// Produce the next reading, stamped now
    fn next_reading(&self) -> Reading;
}
