//! TOML and JSON decoding into a `RelayBlueprint`

use contracts::{ContractError, RelayBlueprint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `None` for anything other than `toml` or `json` (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

fn parse_error<E>(kind: &str, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{kind} parse error: {err}"),
        source: Some(Box::new(err)),
    }
}

pub fn parse_toml(content: &str) -> Result<RelayBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| parse_error("TOML", e))
}

pub fn parse_json(content: &str) -> Result<RelayBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| parse_error("JSON", e))
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<RelayBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
