//! MockSink - scriptable recorder for tests and local runs

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, Reading, Receipt, RecordingSink, SinkKind};
use tokio::time::sleep;

/// Scripted behavior of a MockSink
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Succeed immediately
    Succeed,
    /// Fail immediately with the given message
    Fail(String),
    /// Never complete
    Hang,
    /// Succeed after a delay
    Delay(Duration),
}

/// Recorder with scripted behavior
pub struct MockSink {
    name: String,
    kind: SinkKind,
    behavior: MockBehavior,
    connected: Arc<AtomicBool>,
    calls: Arc<AtomicU64>,
    recorded: Arc<AtomicU64>,
}

impl MockSink {
    pub fn new(name: impl Into<String>, kind: SinkKind, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            kind,
            behavior,
            connected: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicU64::new(0)),
            recorded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Mock ledger recorder
    pub fn ledger(behavior: MockBehavior) -> Self {
        Self::new("mock_ledger", SinkKind::Ledger, behavior)
    }

    /// Mock streaming recorder
    pub fn streaming(behavior: MockBehavior) -> Self {
        Self::new("mock_streaming", SinkKind::Streaming, behavior)
    }

    /// Start disconnected
    pub fn disconnected(self) -> Self {
        self.connected.store(false, Ordering::SeqCst);
        self
    }

    /// Shared counter of `record` invocations
    pub fn calls(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.calls)
    }

    /// Shared counter of successful records
    pub fn recorded(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.recorded)
    }

    /// Shared connection flag
    pub fn connection(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    fn receipt(&self, seq: u64) -> Receipt {
        let receipt = Receipt::new(format!("{}-{seq}", self.name));
        match self.kind {
            SinkKind::Ledger => receipt.with_status("SUCCESS"),
            SinkKind::Streaming => receipt,
        }
    }
}

impl RecordingSink for MockSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SinkKind {
        self.kind
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn record(&mut self, _reading: &Reading) -> Result<Receipt, ContractError> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behavior.clone() {
            MockBehavior::Succeed => {}
            MockBehavior::Fail(message) => {
                return Err(ContractError::sink_write(&self.name, message));
            }
            MockBehavior::Hang => std::future::pending::<()>().await,
            MockBehavior::Delay(delay) => sleep(delay).await,
        }
        self.recorded.fetch_add(1, Ordering::SeqCst);
        Ok(self.receipt(seq))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
