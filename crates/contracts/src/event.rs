//! CompositeEvent and HistoryMessage - Broadcaster input and observer wire messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Reading, SinkKind, SinkOutcome};

/// The unit broadcast to observers
///
/// Built once per reading by the ingestion coordinator and never mutated.
/// An absent outcome means the recorder was not configured or not connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeEvent {
    /// Originating reading
    pub sensor: Reading,

    /// Ledger recorder outcome
    #[serde(rename = "hedera")]
    pub ledger: Option<SinkOutcome>,

    /// Streaming recorder outcome
    #[serde(rename = "neuron")]
    pub streaming: Option<SinkOutcome>,

    /// Event assembly instant
    #[serde(serialize_with = "crate::timestamp::iso_millis::serialize")]
    pub timestamp: DateTime<Utc>,
}

impl CompositeEvent {
    /// Assemble an event stamped with the current instant
    pub fn new(
        sensor: Reading,
        ledger: Option<SinkOutcome>,
        streaming: Option<SinkOutcome>,
    ) -> Self {
        Self {
            sensor,
            ledger,
            streaming,
            timestamp: Utc::now(),
        }
    }

    /// Outcome recorded by the given sink kind, if any
    pub fn outcome(&self, kind: SinkKind) -> Option<&SinkOutcome> {
        match kind {
            SinkKind::Ledger => self.ledger.as_ref(),
            SinkKind::Streaming => self.streaming.as_ref(),
        }
    }
}

/// One-time backfill sent to an observer on connect
///
/// Serialized as `{"type": "history", "data": [Reading, ...]}`, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<Reading>,
}

impl HistoryMessage {
    pub const KIND: &'static str = "history";

    pub fn new(data: Vec<Reading>) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Receipt;

    fn reading(temperature: f64) -> Reading {
        Reading::new("IOT-test", temperature, 50.0, Utc::now())
    }

    #[test]
    fn test_event_wire_keys() {
        let event = CompositeEvent::new(
            reading(21.5),
            Some(SinkOutcome::failed(SinkKind::Ledger, "timeout")),
            None,
        );
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["sensor"]["temperature"], 21.5);
        assert_eq!(value["hedera"]["success"], false);
        assert!(value["neuron"].is_null());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_outcome_lookup_by_kind() {
        let event = CompositeEvent::new(
            reading(22.0),
            None,
            Some(SinkOutcome::succeeded(SinkKind::Streaming, Receipt::new("d"))),
        );
        assert!(event.outcome(SinkKind::Ledger).is_none());
        assert!(event.outcome(SinkKind::Streaming).unwrap().success);
    }

    #[test]
    fn test_history_message_shape() {
        let msg = HistoryMessage::new(vec![reading(1.0), reading(2.0)]);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "history");
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        assert_eq!(value["data"][1]["temperature"], 2.0);
    }
}
