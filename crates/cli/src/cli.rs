//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sensor Relay - real-time sensor fan-out with ledger and stream recording
#[derive(Parser, Debug)]
#[command(
    name = "sensor-relay",
    author,
    version,
    about = "Real-time sensor relay with ledger and stream recording",
    long_about = "Ingests periodic readings from a simulated device, records each one on a \n\
                  ledger gateway and a streaming endpoint, and fans the results out to \n\
                  WebSocket observers with a bounded history backfill."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SENSOR_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level selected by `-v` / `-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay server
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "SENSOR_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override server bind host
    #[arg(long, env = "SENSOR_RELAY_HOST")]
    pub host: Option<String>,

    /// Override server port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Override reading interval in milliseconds
    #[arg(long, env = "SENSOR_RELAY_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Ledger gateway base URL
    #[arg(long, env = "SENSOR_RELAY_LEDGER_GATEWAY_URL")]
    pub ledger_gateway_url: Option<String>,

    /// Ledger operator account id
    #[arg(long, env = "SENSOR_RELAY_LEDGER_ACCOUNT_ID")]
    pub ledger_account_id: Option<String>,

    /// Ledger gateway API key
    #[arg(long, env = "SENSOR_RELAY_LEDGER_API_KEY", hide_env_values = true)]
    pub ledger_api_key: Option<String>,

    /// Maximum number of readings to produce (0 = unlimited)
    #[arg(long, default_value = "0", env = "SENSOR_RELAY_MAX_READINGS")]
    pub max_readings: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "SENSOR_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SENSOR_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
