//! Errors shared by every relay crate
//!
//! Config problems surface at startup; sink problems are turned into failed
//! outcomes by the recorder adapter and never reach the coordinator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// The config file could not be decoded
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A config value broke a rule; `field` is the dotted path
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Recorder is absent or reports itself disconnected
    #[error("sink '{sink_name}' unavailable: {message}")]
    SinkUnavailable { sink_name: String, message: String },

    #[error("sink '{sink_name}' timed out after {timeout_ms}ms")]
    SinkTimeout { sink_name: String, timeout_ms: u64 },

    /// The recorder answered but rejected the reading
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    /// A reading could not be packed into a ledger memo
    #[error("ledger memo error: {message}")]
    Memo { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn sink_unavailable(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn sink_timeout(sink_name: impl Into<String>, timeout_ms: u64) -> Self {
        Self::SinkTimeout {
            sink_name: sink_name.into(),
            timeout_ms,
        }
    }

    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn memo(message: impl Into<String>) -> Self {
        Self::Memo {
            message: message.into(),
        }
    }

    /// True for errors raised while talking to a recorder
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Self::SinkUnavailable { .. }
                | Self::SinkTimeout { .. }
                | Self::SinkWrite { .. }
                | Self::SinkConnection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_messages_name_the_sink() {
        let err = ContractError::sink_timeout("ledger", 5000);
        assert_eq!(err.to_string(), "sink 'ledger' timed out after 5000ms");
        assert!(err.is_sink_error());

        let err = ContractError::config_validation("history.capacity", "must be > 0");
        assert!(err.to_string().contains("'history.capacity'"));
        assert!(!err.is_sink_error());
    }
}
