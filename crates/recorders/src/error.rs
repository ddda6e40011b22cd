//! Recorder construction errors

use thiserror::Error;

/// Errors raised while building a recorder
///
/// Recording itself never errors past the adapter; these only surface at
/// startup.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Error reported by the recorder contract
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl RecorderError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
