//! RecordingSink trait - Sink Adapter backing interface
//!
//! Defines the abstract interface for external recorders.

use crate::{ContractError, Reading, Receipt, SinkKind};

/// External recorder trait
///
/// All recorder implementations must implement this trait. Implementations
/// may fail or stall freely; the Sink Adapter bounds and contains them.
#[trait_variant::make(RecordingSink: Send)]
pub trait LocalRecordingSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Recorder kind, selects the slot in `CompositeEvent`
    fn kind(&self) -> SinkKind;

    /// Whether the recorder is currently connected
    ///
    /// A disconnected recorder is skipped rather than called.
    fn is_connected(&self) -> bool;

    /// Record one reading
    ///
    /// # Errors
    /// Returns a recording error (should include context)
    async fn record(&mut self, reading: &Reading) -> Result<Receipt, ContractError>;

    /// Close recorder
    async fn close(&mut self) -> Result<(), ContractError>;
}
