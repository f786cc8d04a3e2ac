//! Error types for bootline

use thiserror::Error;

/// Main error type for bootline
#[derive(Error, Debug)]
pub enum BootlineError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown unit kind: {0}")]
    UnknownUnit(String),

    #[error("Build error: {0}")]
    BuildError(String),

    #[error("Launch error: {0}")]
    LaunchError(String),

    #[error("{failed} of {total} failed to deploy")]
    DeploymentError { failed: usize, total: usize },

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Stop error: {0}")]
    StopError(String),
}
