//! SinkOutcome - result of one recording attempt
//!
//! The Rust shape is uniform across recorders; only the name of the
//! correlation key on the wire depends on the recorder kind.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::timestamp::format_millis;

/// Recorder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Ledger-style recorder (one transaction per reading)
    Ledger,
    /// Network-streaming recorder
    Streaming,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Ledger => "ledger",
            SinkKind::Streaming => "streaming",
        }
    }

    /// Wire key carrying the correlation id of a successful outcome
    pub fn correlation_key(&self) -> &'static str {
        match self {
            SinkKind::Ledger => "transactionId",
            SinkKind::Streaming => "deviceId",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a recorder hands back on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Recorder-specific correlation id (transaction id, stream device id)
    pub correlation_id: String,
    /// Optional status text reported by the recorder
    pub status: Option<String>,
}

impl Receipt {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Outcome of recording one reading on one sink
#[derive(Debug, Clone, PartialEq)]
pub struct SinkOutcome {
    pub sink: SinkKind,
    pub success: bool,
    pub correlation_id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl SinkOutcome {
    /// Successful outcome from a recorder receipt
    pub fn succeeded(sink: SinkKind, receipt: Receipt) -> Self {
        Self {
            sink,
            success: true,
            correlation_id: Some(receipt.correlation_id),
            status: receipt.status,
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Failed outcome carrying a human-readable reason
    pub fn failed(sink: SinkKind, error: impl Into<String>) -> Self {
        Self {
            sink,
            success: false,
            correlation_id: None,
            status: None,
            error: Some(error.into()),
            completed_at: Utc::now(),
        }
    }
}

impl Serialize for SinkOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.success)?;
        if let Some(ref id) = self.correlation_id {
            map.serialize_entry(self.sink.correlation_key(), id)?;
        }
        if let Some(ref status) = self.status {
            map.serialize_entry("status", status)?;
        }
        if let Some(ref error) = self.error {
            map.serialize_entry("error", error)?;
        }
        map.serialize_entry("timestamp", &format_millis(&self.completed_at))?;
        map.end()
    }
}
