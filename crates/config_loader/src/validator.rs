//! Configuration validation
//!
//! Rules:
//! - device interval > 0, value ranges ordered
//! - history capacity > 0
//! - queue capacities > 0
//! - recorder time budgets > 0
//! - configured ledger has a gateway URL
//! - streaming target parses as a socket address

use contracts::{ContractError, RelayBlueprint};

/// Validate a RelayBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_device(blueprint)?;
    validate_capacities(blueprint)?;
    validate_ledger(blueprint)?;
    validate_streaming(blueprint)?;
    Ok(())
}

/// Validate device cadence and value ranges
fn validate_device(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let device = &blueprint.device;

    if device.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "device.interval_ms",
            "interval_ms must be > 0",
        ));
    }

    if let Some(ref id) = device.device_id {
        if id.trim().is_empty() {
            return Err(ContractError::config_validation(
                "device.device_id",
                "device_id cannot be empty",
            ));
        }
    }

    for (field, [min, max]) in [
        ("device.temperature_range", device.temperature_range),
        ("device.humidity_range", device.humidity_range),
    ] {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(ContractError::config_validation(
                field,
                format!("range min ({min}) must be < max ({max})"),
            ));
        }
    }

    Ok(())
}

/// Validate buffer and queue sizes
fn validate_capacities(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    for (field, value) in [
        ("history.capacity", blueprint.history.capacity),
        ("ingestion.queue_capacity", blueprint.ingestion.queue_capacity),
        ("observers.queue_capacity", blueprint.observers.queue_capacity),
    ] {
        if value == 0 {
            return Err(ContractError::config_validation(
                field,
                "capacity must be > 0",
            ));
        }
    }
    Ok(())
}

/// Validate the ledger section, only when credentials are present
fn validate_ledger(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let Some(ledger) = blueprint.configured_ledger() else {
        return Ok(());
    };

    let url = ledger.gateway_url.as_deref().unwrap_or("").trim();
    if url.is_empty() {
        return Err(ContractError::config_validation(
            "ledger.gateway_url",
            "gateway_url is required when ledger credentials are set",
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "ledger.gateway_url",
            format!("gateway_url must be http(s), got '{url}'"),
        ));
    }
    if ledger.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "ledger.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    if ledger.transfer_hbar <= 0.0 || ledger.max_fee_hbar <= 0.0 {
        return Err(ContractError::config_validation(
            "ledger.transfer_hbar / ledger.max_fee_hbar",
            "amounts must be > 0",
        ));
    }
    Ok(())
}

/// Validate the streaming section
fn validate_streaming(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let streaming = &blueprint.streaming;

    if streaming.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "streaming.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    if let Some(Err(e)) = streaming.socket_addr() {
        return Err(ContractError::config_validation(
            "streaming.addr",
            format!(
                "invalid address '{}': {e}",
                streaming.addr.as_deref().unwrap_or_default()
            ),
        ));
    }

    Ok(())
}
