//! Engine configuration, loaded from JSON. Every section has defaults, so a
//! partial file only overrides what it names.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "URLSIG_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "urlsig.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Signature rule tables
    pub rules: RulesConfig,
    /// Verdict thresholds
    pub risk: RiskConfig,
    /// Parallel batch scanning
    pub batch: BatchConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// JSON rule table; families it omits keep the built-in patterns
    pub custom_rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Malicious-class probability at or above this is reported as Malicious
    pub malicious_threshold: f32,
    /// Score at or above this is high risk (0.0-1.0)
    pub high_threshold: f32,
    /// Score at or above this is medium risk
    pub medium_threshold: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch scans; 0 uses one per core
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            malicious_threshold: 0.5,
            high_threshold: 0.8,
            medium_threshold: 0.5,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl EngineConfig {
    /// Load from JSON file if present and valid; otherwise return default
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|data| Self::from_json_str(&data).ok())
            .unwrap_or_default()
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Path from `URLSIG_CONFIG_PATH`, else `urlsig.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}
