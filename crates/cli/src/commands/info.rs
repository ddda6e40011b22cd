//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    device: DeviceInfo,
    server: String,
    history_capacity: usize,
    queue: QueueInfo,
    recorders: RecordersInfo,
}

#[derive(Serialize)]
struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<String>,
    interval_ms: u64,
    temperature_range: [f64; 2],
    humidity_range: [f64; 2],
}

#[derive(Serialize)]
struct QueueInfo {
    ingest_capacity: usize,
    drop_policy: String,
    observer_capacity: usize,
}

#[derive(Serialize)]
struct RecordersInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger: Option<LedgerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    streaming: Option<StreamingInfo>,
}

/// Ledger details; the API key is never printed
#[derive(Serialize)]
struct LedgerInfo {
    gateway_url: String,
    account_id: String,
    timeout_ms: u64,
    transfer_hbar: f64,
    max_fee_hbar: f64,
}

#[derive(Serialize)]
struct StreamingInfo {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<String>,
    timeout_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;
    let info = build_config_info(&blueprint);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &RelayBlueprint) -> ConfigInfo {
    let ledger = blueprint.configured_ledger().map(|l| LedgerInfo {
        gateway_url: l.gateway_url.clone().unwrap_or_default(),
        account_id: l.account_id.clone().unwrap_or_default(),
        timeout_ms: l.timeout_ms,
        transfer_hbar: l.transfer_hbar,
        max_fee_hbar: l.max_fee_hbar,
    });

    let streaming = blueprint.streaming.enabled.then(|| StreamingInfo {
        target: blueprint
            .streaming
            .addr
            .clone()
            .unwrap_or_else(|| "simulated".to_string()),
        device_id: blueprint.streaming.device_id.clone(),
        timeout_ms: blueprint.streaming.timeout_ms,
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        device: DeviceInfo {
            device_id: blueprint.device.device_id.clone(),
            interval_ms: blueprint.device.interval_ms,
            temperature_range: blueprint.device.temperature_range,
            humidity_range: blueprint.device.humidity_range,
        },
        server: format!("{}:{}", blueprint.server.host, blueprint.server.port),
        history_capacity: blueprint.history.capacity,
        queue: QueueInfo {
            ingest_capacity: blueprint.ingestion.queue_capacity,
            drop_policy: format!("{:?}", blueprint.ingestion.drop_policy),
            observer_capacity: blueprint.observers.queue_capacity,
        },
        recorders: RecordersInfo { ledger, streaming },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Sensor Relay Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📋 Version: {}\n", info.version);

    println!("📟 Device");
    println!(
        "   ├─ Id: {}",
        info.device.device_id.as_deref().unwrap_or("(generated)")
    );
    println!("   ├─ Interval: {}ms", info.device.interval_ms);
    println!("   ├─ Temperature: {:?} °C", info.device.temperature_range);
    println!("   └─ Humidity: {:?} %", info.device.humidity_range);

    println!("\n🌐 Server: {}", info.server);
    println!("   ├─ History: {} readings", info.history_capacity);
    println!(
        "   ├─ Work queue: {} ({})",
        info.queue.ingest_capacity, info.queue.drop_policy
    );
    println!("   └─ Observer queue: {}", info.queue.observer_capacity);

    println!("\n📝 Recorders");
    match &info.recorders.ledger {
        Some(l) => println!(
            "   ├─ Ledger: {} account={} timeout={}ms fee<={} transfer={}",
            l.gateway_url, l.account_id, l.timeout_ms, l.max_fee_hbar, l.transfer_hbar
        ),
        None => println!("   ├─ Ledger: not configured"),
    }
    match &info.recorders.streaming {
        Some(s) => println!(
            "   └─ Streaming: {} device={} timeout={}ms",
            s.target,
            s.device_id.as_deref().unwrap_or("(device id)"),
            s.timeout_ms
        ),
        None => println!("   └─ Streaming: disabled"),
    }
    println!();
}
