//! `validate`: load a config file and report problems without starting
//! anything.

use std::fmt;

use anyhow::{Context, Result};
use contracts::{DropPolicy, RelayBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    interval_ms: u64,
    history_capacity: usize,
    ledger_configured: bool,
    streaming_enabled: bool,
}

impl ValidationResult {
    fn accepted(config_path: String, blueprint: &RelayBlueprint) -> Self {
        Self {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(blueprint),
            summary: Some(ConfigSummary {
                version: format!("{:?}", blueprint.version),
                interval_ms: blueprint.device.interval_ms,
                history_capacity: blueprint.history.capacity,
                ledger_configured: blueprint.configured_ledger().is_some(),
                streaming_enabled: blueprint.streaming.enabled,
            }),
        }
    }

    fn rejected(config_path: String, error: String) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error),
            warnings: Vec::new(),
            summary: None,
        }
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating relay config");

    let result = validate_config(args);
    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print!("{result}");
    }

    if !result.valid {
        anyhow::bail!("Relay config rejected: {}", result.config_path);
    }
    Ok(())
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let path = args.config.display().to_string();
    if !args.config.exists() {
        let error = format!("File not found: {path}");
        return ValidationResult::rejected(path, error);
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => ValidationResult::accepted(path, &blueprint),
        Err(e) => ValidationResult::rejected(path, e.to_string()),
    }
}

/// Settings that load fine but are probably not what the operator meant
fn collect_warnings(blueprint: &RelayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.configured_ledger().is_none() {
        let reason = match blueprint.ledger {
            Some(_) => "ledger section present but account_id/api_key missing",
            None => "no ledger section",
        };
        warnings.push(format!("Ledger recording disabled: {reason}"));
    }

    match (blueprint.streaming.enabled, &blueprint.streaming.addr) {
        (false, _) => warnings.push("Streaming recorder disabled".to_string()),
        (true, None) => warnings
            .push("streaming.addr not set, so the streaming recorder runs simulated".to_string()),
        (true, Some(_)) => {}
    }

    if blueprint.ingestion.drop_policy != DropPolicy::Block {
        warnings.push(format!(
            "ingestion.drop_policy = {:?}: periodic readings may be discarded under load",
            blueprint.ingestion.drop_policy
        ));
    }

    warnings
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            writeln!(f, "✗ Relay config is invalid: {}", self.config_path)?;
            if let Some(error) = &self.error {
                writeln!(f, "\n  Error: {error}")?;
            }
            return Ok(());
        }

        writeln!(f, "✓ Relay config is valid: {}", self.config_path)?;
        if let Some(s) = &self.summary {
            writeln!(f)?;
            writeln!(f, "  Version:   {}", s.version)?;
            writeln!(f, "  Interval:  {}ms", s.interval_ms)?;
            writeln!(f, "  History:   {} readings", s.history_capacity)?;
            writeln!(f, "  Ledger:    {}", on_off(s.ledger_configured))?;
            writeln!(f, "  Streaming: {}", on_off(s.streaming_enabled))?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "\n⚠ Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }
        Ok(())
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
