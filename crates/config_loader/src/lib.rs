//! # Config Loader
//!
//! Reads a relay config file (TOML or JSON), fills in defaults and checks
//! it before any task starts.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("relay.toml")).unwrap();
//! println!("History capacity: {}", blueprint.history.capacity);
//! ```

mod parser;
mod validator;

pub use contracts::RelayBlueprint;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::ContractError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, parse and validate a config file; the extension picks the format
    pub fn load_from_path(path: &Path) -> Result<RelayBlueprint, ContractError> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate config text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RelayBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    pub fn to_toml(blueprint: &RelayBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &RelayBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

fn format_of(path: &Path) -> Result<ConfigFormat, ContractError> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Err(ContractError::config_parse(
            "cannot determine file format from extension",
        ));
    };
    ConfigFormat::from_extension(ext)
        .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
}
