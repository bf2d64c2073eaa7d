//! Configuration handling for Trellis.
//! Pipeline settings are read from `trellis.json`, `trellis.yml` or `trellis.yaml`;
//! every field has a default, and a missing file means all defaults.

use crate::constants::{CONFIG_FILES, DEFAULT_MODE, DEFAULT_OUTPUT, DEFAULT_TEMPLATES_DIR};
use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings passed explicitly to the pipeline on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root of the template store (`templates/` and `macros/` inside it)
    pub templates_dir: PathBuf,
    /// Mode the root node is rendered at when none is requested
    pub default_mode: String,
    /// Where the rendered specification is written
    pub output: PathBuf,
    /// Directory the specification's `output_dir` is resolved against
    pub build_root: PathBuf,
    /// Check input trees against a JSON Schema before compiling
    pub validate: bool,
    /// Schema to validate against instead of the built-in tree schema
    pub schema: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            default_mode: DEFAULT_MODE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            build_root: PathBuf::from("."),
            validate: true,
            schema: None,
        }
    }
}

/// Loads the first configuration file found in `config_dir`.
///
/// # Arguments
/// * `config_dir` - Directory to look in
/// * `config_files` - File names to try, in order
///
/// # Returns
/// * `Result<Option<String>>` - Contents of the first existing file, `None` if there is none
pub fn load_config<P: AsRef<Path>>(config_dir: P, config_files: &[&str]) -> Result<Option<String>> {
    for file in config_files {
        let config_path = config_dir.as_ref().join(file);
        if config_path.exists() {
            debug!("Loading configuration from {}", config_path.display());
            return Ok(Some(std::fs::read_to_string(&config_path).map_err(Error::IoError)?));
        }
    }

    debug!("No configuration file found (tried: {})", config_files.join(", "));
    Ok(None)
}

/// Parses configuration content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither, or has unknown fields
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}"))),
    }
}

/// Returns the configuration for `config_dir`, falling back to defaults.
pub fn get_config<P: AsRef<Path>>(config_dir: P) -> Result<PipelineConfig> {
    match load_config(config_dir, &CONFIG_FILES)? {
        // An empty YAML document deserializes to unit, not a map.
        Some(content) if content.trim().is_empty() => Ok(PipelineConfig::default()),
        Some(content) => parse_config(&content),
        None => Ok(PipelineConfig::default()),
    }
}
