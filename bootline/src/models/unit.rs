//! Unit models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::BootlineError;

/// A unit specification read from the configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Unit name
    pub name: String,

    /// Registry key used to build the unit; falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Number of replicas to deploy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,

    /// Opaque per-unit configuration
    #[serde(default)]
    pub config: serde_json::Value,
}

impl UnitSpec {
    /// Create a spec with a single instance and no configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            instances: None,
            config: serde_json::Value::Null,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_instances(mut self, instances: i64) -> Self {
        self.instances = Some(instances);
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Registry key for this unit
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }

    /// Replica count; unset and non-positive values count as one
    pub fn instance_count(&self) -> usize {
        match self.instances {
            Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => 1,
        }
    }
}

/// Outcome of a single deployment
#[derive(Debug)]
pub enum DeploymentOutcome {
    /// Unit started and was assigned a deployment ID
    Success(String),

    /// Unit failed to build, launch or start
    Failure(BootlineError),
}

impl DeploymentOutcome {
    /// A success without a usable ID counts as a failure
    pub fn is_failure(&self) -> bool {
        match self {
            DeploymentOutcome::Success(id) => id.is_empty(),
            DeploymentOutcome::Failure(_) => true,
        }
    }
}

impl From<Result<String, BootlineError>> for DeploymentOutcome {
    fn from(result: Result<String, BootlineError>) -> Self {
        match result {
            Ok(id) => DeploymentOutcome::Success(id),
            Err(e) => DeploymentOutcome::Failure(e),
        }
    }
}

/// Terminal verdict of one deployment round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AggregateResult {
    Success { total: usize },
    Failure { failed: usize, total: usize },
}

impl AggregateResult {
    pub(crate) fn from_counts(failed: usize, total: usize) -> Self {
        if failed == 0 {
            AggregateResult::Success { total }
        } else {
            AggregateResult::Failure { failed, total }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AggregateResult::Success { .. })
    }

    pub fn total(&self) -> usize {
        match self {
            AggregateResult::Success { total } | AggregateResult::Failure { total, .. } => *total,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            AggregateResult::Success { .. } => 0,
            AggregateResult::Failure { failed, .. } => *failed,
        }
    }

    /// Convert into a `Result`, keeping the total on success
    pub fn into_result(self) -> Result<usize, BootlineError> {
        match self {
            AggregateResult::Success { total } => Ok(total),
            AggregateResult::Failure { failed, total } => {
                Err(BootlineError::DeploymentError { failed, total })
            }
        }
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateResult::Success { total } => {
                write!(f, "Deployed {} unit(s) successfully", total)
            }
            AggregateResult::Failure { failed, total } => {
                write!(f, "{} of {} failed to deploy", failed, total)
            }
        }
    }
}
