//! `sensor-relay`: runs the relay, or checks and describes a config file.

mod cli;
mod commands;
mod error;
mod pipeline;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_relay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_tracing(cli.log_format.into(), cli.log_level())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sensor Relay starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_relay(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    result.inspect_err(|e| tracing::error!(error = %e, "Command failed"))
}
