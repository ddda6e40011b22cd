//! Relay lifecycle: build every component, run, then shut down in order.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::RelayStats;
