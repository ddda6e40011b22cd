//! # Broadcaster
//!
//! Observer set and real-time fan-out.
//!
//! Responsibilities:
//! - Register observers and backfill each with the current history window
//! - Deliver every composite event to every connected observer, in order
//! - Isolate observers: a slow or broken one never stalls the others
//!
//! Each observer owns a bounded outbound queue of serialized text frames.
//! The transport session (WebSocket) drains it; the broadcaster never
//! awaits a send.

mod broadcaster;
mod error;
mod metrics;
mod observer;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use error::BroadcastError;
pub use metrics::{BroadcastMetrics, BroadcastMetricsSnapshot};
pub use observer::{Frame, ObserverId, ObserverState, Subscription};
