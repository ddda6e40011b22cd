//! RelayBlueprint - Config Loader output
//!
//! Describes the whole relay: device cadence, history window, queues,
//! server binding and the two recorders. Every field has a default, so an
//! empty document is a valid blueprint.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Simulated device settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// History window settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Work queue between source and coordinator
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Observer fan-out settings
    #[serde(default)]
    pub observers: ObserverConfig,

    /// HTTP / WebSocket binding
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger recorder (absent section = not configured)
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,

    /// Streaming recorder
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Fixed device id (generated when absent)
    #[serde(default)]
    pub device_id: Option<String>,

    /// Reading cadence in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Temperature range [min, max) in °C
    #[serde(default = "default_temperature_range")]
    pub temperature_range: [f64; 2],

    /// Humidity range [min, max) in %
    #[serde(default = "default_humidity_range")]
    pub humidity_range: [f64; 2],
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_temperature_range() -> [f64; 2] {
    [20.0, 30.0]
}

fn default_humidity_range() -> [f64; 2] {
    [40.0, 60.0]
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            interval_ms: default_interval_ms(),
            temperature_range: default_temperature_range(),
            humidity_range: default_humidity_range(),
        }
    }
}

impl DeviceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// History window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of most recent readings retained for backfill
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    50
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Ingestion work queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Work queue capacity
    #[serde(default = "default_ingest_queue_capacity")]
    pub queue_capacity: usize,

    /// Policy for periodic readings when the queue is full
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_ingest_queue_capacity() -> usize {
    16
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_ingest_queue_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

/// Drop policy when the work queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Wait for room (source cadence slows down)
    #[default]
    Block,
    /// Discard the new reading
    DropNewest,
    /// Evict the oldest queued reading
    DropOldest,
}

/// Observer fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Outbound frame queue per observer
    #[serde(default = "default_observer_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_observer_queue_capacity() -> usize {
    64
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_observer_queue_capacity(),
        }
    }
}

/// Server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Ledger recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Ledger gateway base URL
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Operator account id
    #[serde(default)]
    pub account_id: Option<String>,

    /// Gateway API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-record time budget in milliseconds
    #[serde(default = "default_ledger_timeout_ms")]
    pub timeout_ms: u64,

    /// Self-transfer amount per reading
    #[serde(default = "default_transfer_hbar")]
    pub transfer_hbar: f64,

    /// Maximum transaction fee
    #[serde(default = "default_max_fee_hbar")]
    pub max_fee_hbar: f64,
}

fn default_ledger_timeout_ms() -> u64 {
    10_000
}

fn default_transfer_hbar() -> f64 {
    0.001
}

fn default_max_fee_hbar() -> f64 {
    2.0
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            account_id: None,
            api_key: None,
            timeout_ms: default_ledger_timeout_ms(),
            transfer_hbar: default_transfer_hbar(),
            max_fee_hbar: default_max_fee_hbar(),
        }
    }
}

impl LedgerConfig {
    /// Credentials present: the ledger recorder takes part in ingestion
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.account_id) && present(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Streaming recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Connect the recorder at startup
    #[serde(default = "default_streaming_enabled")]
    pub enabled: bool,

    /// Stream device id (defaults to the device id)
    #[serde(default)]
    pub device_id: Option<String>,

    /// UDP target; absent runs the recorder in simulated mode
    #[serde(default)]
    pub addr: Option<String>,

    /// Per-record time budget in milliseconds
    #[serde(default = "default_streaming_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_streaming_enabled() -> bool {
    true
}

fn default_streaming_timeout_ms() -> u64 {
    2_000
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: default_streaming_enabled(),
            device_id: None,
            addr: None,
            timeout_ms: default_streaming_timeout_ms(),
        }
    }
}

impl StreamingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed UDP target, if any
    pub fn socket_addr(&self) -> Option<Result<SocketAddr, std::net::AddrParseError>> {
        self.addr.as_deref().map(str::parse)
    }
}

impl RelayBlueprint {
    /// Ledger section with usable credentials, if any
    pub fn configured_ledger(&self) -> Option<&LedgerConfig> {
        self.ledger.as_ref().filter(|l| l.is_configured())
    }
}
