//! Configuration loading and parsing

use anyhow::{Context, Result};
use robot_log_core::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// How the console shows events
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Print events as JSON lines instead of canonical text
    #[serde(default)]
    pub json: bool,
    /// Report connect/disconnect transitions
    #[serde(default = "default_true")]
    pub show_connectivity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            json: false,
            show_connectivity: true,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .logger
        .validate()
        .with_context(|| format!("Invalid logger settings in {:?}", path))?;

    Ok(config)
}
