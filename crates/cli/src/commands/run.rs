//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{LedgerConfig, RelayBlueprint};
use std::time::Duration;
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::error;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            load_blueprint(path)?
        }
        None => {
            info!("No configuration file given, using defaults");
            RelayBlueprint::default()
        }
    };

    apply_overrides(&mut blueprint, args)?;

    info!(
        host = %blueprint.server.host,
        port = blueprint.server.port,
        interval_ms = blueprint.device.interval_ms,
        history = blueprint.history.capacity,
        ledger = blueprint.configured_ledger().is_some(),
        streaming = blueprint.streaming.enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_readings: if args.max_readings == 0 {
            None
        } else {
            Some(args.max_readings)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    info!("Starting relay...");

    let stats = Pipeline::new(pipeline_config)
        .run(setup_shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        readings_processed = stats.ingestion.readings_processed,
        readings_dropped = stats.ingestion.readings_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        rate = format!("{:.2}", stats.readings_per_sec()),
        "Relay completed successfully"
    );
    stats.print_summary();

    info!("Sensor Relay finished");
    Ok(())
}

/// Apply command-line overrides, then re-validate
fn apply_overrides(blueprint: &mut RelayBlueprint, args: &RunArgs) -> error::Result<()> {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding server host from CLI");
        blueprint.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding server port from CLI");
        blueprint.server.port = port;
    }
    if let Some(interval_ms) = args.interval_ms {
        info!(interval_ms, "Overriding reading interval from CLI");
        blueprint.device.interval_ms = interval_ms;
    }

    let ledger_overrides = [
        &args.ledger_gateway_url,
        &args.ledger_account_id,
        &args.ledger_api_key,
    ];
    if ledger_overrides.iter().any(|o| o.is_some()) {
        let ledger = blueprint.ledger.get_or_insert_with(LedgerConfig::default);
        if let Some(ref url) = args.ledger_gateway_url {
            ledger.gateway_url = Some(url.clone());
        }
        if let Some(ref account_id) = args.ledger_account_id {
            info!(account_id = %account_id, "Overriding ledger account from CLI");
            ledger.account_id = Some(account_id.clone());
        }
        if let Some(ref api_key) = args.ledger_api_key {
            ledger.api_key = Some(api_key.clone());
        }
    }

    config_loader::validate(blueprint)?;
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!(
        "  Id: {}",
        blueprint.device.device_id.as_deref().unwrap_or("(generated)")
    );
    println!("  Interval: {}ms", blueprint.device.interval_ms);
    println!(
        "  Temperature: {:?} °C, Humidity: {:?} %",
        blueprint.device.temperature_range, blueprint.device.humidity_range
    );

    println!("\nServer: {}:{}", blueprint.server.host, blueprint.server.port);
    println!("History: {} readings", blueprint.history.capacity);
    println!(
        "Work queue: {} ({:?})",
        blueprint.ingestion.queue_capacity, blueprint.ingestion.drop_policy
    );

    println!("\nRecorders:");
    match blueprint.configured_ledger() {
        Some(ledger) => println!(
            "  - ledger: {} (account {}, timeout {}ms)",
            ledger.gateway_url.as_deref().unwrap_or_default(),
            ledger.account_id.as_deref().unwrap_or_default(),
            ledger.timeout_ms
        ),
        None => println!("  - ledger: not configured"),
    }
    if blueprint.streaming.enabled {
        println!(
            "  - streaming: {} (timeout {}ms)",
            blueprint.streaming.addr.as_deref().unwrap_or("simulated"),
            blueprint.streaming.timeout_ms
        );
    } else {
        println!("  - streaming: disabled");
    }

    println!();
}
