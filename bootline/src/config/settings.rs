//! Settings document

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;
use crate::models::unit::UnitSpec;

/// Bootline settings, read from the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Tear everything down if any unit fails to deploy
    #[serde(default = "default_true")]
    pub abort_on_failure: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Time allowed for units to stop on shutdown, in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Units to deploy
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

fn default_true() -> bool {
    true
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            abort_on_failure: true,
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
            units: Vec::new(),
        }
    }
}
