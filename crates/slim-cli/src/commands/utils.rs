//! Shared setup for commands.

use crate::config::{CliOverrides, SlimConfig, ValidatedConfig};
use crate::error::{Result, ResultExt};
use std::path::Path;

/// Load every configuration layer and validate it against the working
/// directory.
pub fn load_config(overrides: &CliOverrides, config_path: Option<&Path>) -> Result<ValidatedConfig> {
    let root = std::env::current_dir().context("Failed to read the working directory")?;
    let config = SlimConfig::load(overrides, config_path, &root)?;
    let validated = config.validate(&root)?;

    tracing::debug!(
        entry = %validated.entry.display(),
        target = %validated.target,
        "configuration loaded"
    );
    Ok(validated)
}
