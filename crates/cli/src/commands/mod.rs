//! CLI command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_relay;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::RelayBlueprint;

use crate::error::CliError;

/// Load a blueprint from an existing file
fn load_blueprint(path: &Path) -> Result<RelayBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
