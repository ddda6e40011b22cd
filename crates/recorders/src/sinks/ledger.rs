//! LedgerSink - one gateway transaction per reading
//!
//! Each reading becomes a tiny self-transfer whose memo carries the
//! compact reading; the gateway answers with the transaction id and its
//! receipt status.

use std::time::Duration;

use contracts::{
    timestamp::format_millis, ContractError, LedgerConfig, Reading, Receipt, RecordingSink,
    SinkKind,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Ledger memo size limit in bytes
pub const MAX_MEMO_BYTES: usize = 100;

/// Configuration for LedgerSink
#[derive(Debug, Clone)]
pub struct LedgerSinkConfig {
    /// Gateway base URL
    pub gateway_url: String,
    /// Operator account id
    pub account_id: String,
    /// Gateway API key
    pub api_key: String,
    /// Self-transfer amount
    pub transfer_hbar: f64,
    /// Maximum transaction fee
    pub max_fee_hbar: f64,
    /// HTTP client timeout (backstop behind the adapter budget)
    pub request_timeout: Duration,
}

impl LedgerSinkConfig {
    /// Build from the blueprint section
    ///
    /// # Errors
    /// Missing credentials or gateway URL.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, ContractError> {
        let required = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ContractError::config_validation(format!("ledger.{field}"), "missing value")
                })
        };

        Ok(Self {
            gateway_url: required(&config.gateway_url, "gateway_url")?
                .trim_end_matches('/')
                .to_string(),
            account_id: required(&config.account_id, "account_id")?,
            api_key: required(&config.api_key, "api_key")?,
            transfer_hbar: config.transfer_hbar,
            max_fee_hbar: config.max_fee_hbar,
            request_timeout: config.timeout(),
        })
    }
}

#[derive(Serialize)]
struct MemoBody<'a> {
    t: f64,
    h: f64,
    ts: String,
    d: &'a str,
}

/// Compact memo for one reading: `{"t":..,"h":..,"ts":..,"d":..}`
///
/// # Errors
/// The memo exceeds `MAX_MEMO_BYTES`.
pub fn ledger_memo(reading: &Reading) -> Result<String, ContractError> {
    let memo = serde_json::to_string(&MemoBody {
        t: reading.temperature,
        h: reading.humidity,
        ts: format_millis(&reading.timestamp),
        d: &reading.device_id,
    })
    .map_err(|e| ContractError::memo(format!("encode failed: {e}")))?;

    if memo.len() > MAX_MEMO_BYTES {
        return Err(ContractError::memo(format!(
            "memo is {} bytes, ledger limit is {MAX_MEMO_BYTES}",
            memo.len()
        )));
    }
    Ok(memo)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest<'a> {
    operator_account_id: &'a str,
    memo: String,
    transfer_hbar: f64,
    max_fee_hbar: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_id: String,
    status: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
}

/// Recorder that submits readings to a ledger gateway
pub struct LedgerSink {
    name: String,
    config: LedgerSinkConfig,
    client: Client,
    connected: bool,
}

impl LedgerSink {
    /// Create a new LedgerSink
    pub fn new(name: impl Into<String>, config: LedgerSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ContractError::sink_connection(&name, format!("failed to build HTTP client: {e}"))
            })?;

        debug!(sink = %name, gateway = %config.gateway_url, "LedgerSink created");

        Ok(Self {
            name,
            config,
            client,
            connected: true,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.config.account_id
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.gateway_url)
    }

    /// Query the operator balance
    #[instrument(name = "ledger_sink_check_balance", skip(self), fields(sink = %self.name))]
    pub async fn check_balance(&self) -> Result<String, ContractError> {
        let url = self.endpoint(&format!(
            "/api/v1/accounts/{}/balance",
            self.config.account_id
        ));
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::sink_write(
                &self.name,
                format!("balance query returned HTTP {status}"),
            ));
        }

        let body: BalanceResponse = response
            .json()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("bad balance body: {e}")))?;
        Ok(body.balance)
    }

    async fn submit(&self, memo: String) -> Result<TransactionReceipt, ContractError> {
        let request = TransactionRequest {
            operator_account_id: &self.config.account_id,
            memo,
            transfer_hbar: self.config.transfer_hbar,
            max_fee_hbar: self.config.max_fee_hbar,
        };

        let response = self
            .client
            .post(self.endpoint("/api/v1/transactions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::sink_write(
                &self.name,
                format!("gateway returned HTTP {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("bad receipt body: {e}")))
    }
}

impl RecordingSink for LedgerSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Ledger
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    #[instrument(name = "ledger_sink_record", skip(self, reading), fields(sink = %self.name))]
    async fn record(&mut self, reading: &Reading) -> Result<Receipt, ContractError> {
        if !self.connected {
            return Err(ContractError::sink_unavailable(&self.name, "client closed"));
        }

        let memo = ledger_memo(reading)?;
        let receipt = self.submit(memo).await?;

        info!(
            sink = %self.name,
            transaction_id = %receipt.transaction_id,
            status = %receipt.status,
            "Transaction recorded"
        );

        Ok(Receipt::new(receipt.transaction_id).with_status(receipt.status))
    }

    #[instrument(name = "ledger_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.connected = false;
        debug!(sink = %self.name, "LedgerSink closed");
        Ok(())
    }
}
