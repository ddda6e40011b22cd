//! Recorder implementations
//!
//! Contains LedgerSink, StreamingSink, and the scriptable MockSink.

mod ledger;
mod mock;
mod streaming;

pub use self::ledger::{ledger_memo, LedgerSink, LedgerSinkConfig, MAX_MEMO_BYTES};
pub use self::mock::{MockBehavior, MockSink};
pub use self::streaming::{StreamMode, StreamingSink, StreamingSinkConfig};
