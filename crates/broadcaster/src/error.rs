//! Broadcaster error types

use thiserror::Error;

/// Broadcaster error
///
/// Observer send failures are not errors: the observer is removed and the
/// broadcast carries on.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Message could not be encoded as JSON
    #[error("failed to serialize observer message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Broadcaster is shutting down and takes no new observers
    #[error("broadcaster is closed")]
    Closed,
}
