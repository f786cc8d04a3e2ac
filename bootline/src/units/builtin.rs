//! Simple in-process units

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::deploy::unit::Unit;
use crate::errors::BootlineError;
use crate::models::unit::UnitSpec;

/// Unit that logs a message when started
pub struct LogUnit {
    name: String,
    replica: usize,
    message: String,
}

impl LogUnit {
    pub const KIND: &'static str = "log";

    pub fn new(spec: &UnitSpec, replica: usize) -> Result<Self, BootlineError> {
        let message = spec
            .config
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("started")
            .to_string();

        Ok(Self {
            name: spec.name.clone(),
            replica,
            message,
        })
    }
}

#[async_trait]
impl Unit for LogUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BootlineError> {
        info!(unit = %self.name, replica = self.replica, "{}", self.message);
        Ok(())
    }
}

/// Unit that takes a fixed time to start, optionally failing afterwards
pub struct DelayUnit {
    name: String,
    replica: usize,
    delay_ms: u64,
    fail: bool,
}

impl DelayUnit {
    pub const KIND: &'static str = "delay";

    pub fn new(spec: &UnitSpec, replica: usize) -> Result<Self, BootlineError> {
        let delay_ms = spec
            .config
            .get("delay_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let fail = spec
            .config
            .get("fail")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self {
            name: spec.name.clone(),
            replica,
            delay_ms,
            fail,
        })
    }
}

#[async_trait]
impl Unit for DelayUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BootlineError> {
        debug!("Delay: {}ms ({} #{})", self.delay_ms, self.name, self.replica);
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        if self.fail {
            return Err(BootlineError::LaunchError(format!(
                "Unit {} #{} configured to fail",
                self.name, self.replica
            )));
        }
        Ok(())
    }
}
