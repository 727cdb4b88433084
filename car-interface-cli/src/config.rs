//! Configuration loading and parsing

use anyhow::{Context, Result};
use car_interface::{ActuationRequest, BusAssignment, VariantConfig, VisualAlert};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub buses: BusAssignment,
    #[serde(default)]
    pub actuation: ActuationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Replaces the built-in preset; missing fields keep the preset's values
    pub variant: Option<VariantConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// candump log to replay; without one the schedule is dumped
    pub log: Option<PathBuf>,
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
}

/// Constant planner request applied on every cycle
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ActuationConfig {
    pub steer: f64,
    pub gas: f64,
    pub brake: f64,
    pub enabled: bool,
    pub cancel_requested: bool,
    pub hud_alert: VisualAlert,
}

impl ActuationConfig {
    pub fn request(&self) -> ActuationRequest {
        ActuationRequest {
            steer: self.steer,
            gas: self.gas,
            brake: self.brake,
            enabled: self.enabled,
            cancel_requested: self.cancel_requested,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
    /// Include the decoded vehicle state with every cycle
    #[serde(default = "default_include_state")]
    pub include_state: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
            include_state: default_include_state(),
        }
    }
}

fn default_include_state() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    // Flag binding defaults follow the configured polarity
    config.variant = config.variant.map(|variant| {
        let flag = variant.wheel_speed_flag;
        variant.with_wheel_speed_flag(flag)
    });

    if let Some(variant) = &config.variant {
        variant
            .validate()
            .with_context(|| format!("Invalid variant '{}' in {:?}", variant.name, path))?;
    }

    Ok(config)
}
