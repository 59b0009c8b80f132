//! Tracing context configuration
//!
//! Loaded from TOML; every field has a default, so an empty document is valid.

use std::path::Path;

use miette::Report;
use serde::{Deserialize, Serialize};

pub type ConfigError = Report;

fn config_msg(message: impl Into<String>) -> ConfigError {
    Report::msg(message.into())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub frames: FrameConfig,

    #[serde(default)]
    pub modules: ModuleConfig,
}

/// Frame stack settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Deepest frame nesting a single trace may record
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Module registry settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Separator placed before the collision counter of a uniquified name
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_max_depth() -> usize {
    512
}

fn default_separator() -> String {
    "_".to_string()
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            separator: default_separator(),
        }
    }
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_msg(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Parse TOML from string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: TraceConfig = toml::from_str(content)
            .map_err(|e| config_msg(format!("Invalid config format: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| config_msg(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames.max_depth == 0 {
            return Err(config_msg("frames.max_depth must be at least 1"));
        }
        if self.modules.separator.is_empty() {
            return Err(config_msg("modules.separator must not be empty"));
        }
        Ok(())
    }
}
