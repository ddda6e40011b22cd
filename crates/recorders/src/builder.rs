//! Recorder construction from the blueprint
//!
//! A recorder that is not configured (ledger without credentials) or not
//! enabled (streaming) yields `None`; the coordinator skips it and reports
//! its outcome as absent.

use contracts::{RelayBlueprint, StreamingConfig};
use tracing::{info, instrument, warn};

use crate::adapter::SinkAdapter;
use crate::error::RecorderError;
use crate::sinks::{LedgerSink, LedgerSinkConfig, StreamingSink, StreamingSinkConfig};

const LEDGER_SINK_NAME: &str = "ledger";
const STREAMING_SINK_NAME: &str = "streaming";

/// Create the ledger adapter, if credentials are configured
///
/// The operator balance is probed once; a failed probe is logged and the
/// recorder stays in place.
#[instrument(name = "recorders_create_ledger_adapter", skip(blueprint))]
pub async fn create_ledger_adapter(
    blueprint: &RelayBlueprint,
) -> Result<Option<SinkAdapter<LedgerSink>>, RecorderError> {
    let Some(ledger) = blueprint.configured_ledger() else {
        warn!("Ledger credentials not configured, ledger recording disabled");
        return Ok(None);
    };

    let config = LedgerSinkConfig::from_config(ledger)
        .map_err(|e| RecorderError::sink_creation(LEDGER_SINK_NAME, e.to_string()))?;
    let sink = LedgerSink::new(LEDGER_SINK_NAME, config)
        .map_err(|e| RecorderError::sink_creation(LEDGER_SINK_NAME, e.to_string()))?;

    match sink.check_balance().await {
        Ok(balance) => info!(account = %sink.account_id(), %balance, "Ledger client initialized"),
        Err(e) => warn!(account = %sink.account_id(), error = %e, "Ledger balance check failed"),
    }

    Ok(Some(SinkAdapter::new(sink, ledger.timeout())))
}

/// Create the streaming adapter, if enabled
#[instrument(name = "recorders_create_streaming_adapter", skip(config))]
pub async fn create_streaming_adapter(
    config: &StreamingConfig,
    device_id: &str,
) -> Result<Option<SinkAdapter<StreamingSink>>, RecorderError> {
    if !config.enabled {
        info!("Streaming recorder disabled");
        return Ok(None);
    }

    let target = config
        .socket_addr()
        .transpose()
        .map_err(|e| RecorderError::sink_creation(STREAMING_SINK_NAME, e.to_string()))?;

    let sink_config = StreamingSinkConfig {
        device_id: config
            .device_id
            .clone()
            .unwrap_or_else(|| device_id.to_string()),
        target,
    };
    let sink = StreamingSink::connect(STREAMING_SINK_NAME, sink_config).await?;

    Ok(Some(SinkAdapter::new(sink, config.timeout())))
}
