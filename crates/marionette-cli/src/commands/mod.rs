// Path: crates/marionette-cli/src/commands/mod.rs

pub mod config;
pub mod exec;
pub mod release;
pub mod screenshot;

use anyhow::{Context, Result};
use marionette_types::config::OperatorConfig;
use std::path::Path;

/// Loads and validates an operator config, or returns the defaults when no
/// path is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<OperatorConfig> {
    match path {
        Some(path) => OperatorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(OperatorConfig::default()),
    }
}
