//! Configuration loading from disk and the command line.

use std::fs;
use std::path::Path;

use crate::config::args::Args;
use crate::config::schema::StreamerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read and parse a TOML configuration file.
///
/// The result is not validated yet: flags and environment may still
/// override it, so validation runs once in [`resolve_config`].
pub fn load_config(path: &Path) -> Result<StreamerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Resolve the effective configuration: defaults, then the optional file,
/// then environment/flag overrides carried by `args`.
pub fn resolve_config(args: &Args) -> Result<StreamerConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => StreamerConfig::default(),
    };

    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
