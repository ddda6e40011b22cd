//! Errors the CLI reports before the relay starts.

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// A flag or env override broke a config rule
    #[error("Invalid configuration after overrides: {0}")]
    InvalidOverride(#[from] ContractError),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.to_path_buf(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
