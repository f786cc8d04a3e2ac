//! Unit that runs an external process

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::deploy::unit::Unit;
use crate::errors::BootlineError;
use crate::models::unit::UnitSpec;

/// Runs `program` with `args` and `env` for as long as the unit is deployed
pub struct CommandUnit {
    name: String,
    replica: usize,
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    child: Mutex<Option<Child>>,
}

impl CommandUnit {
    pub const KIND: &'static str = "command";

    pub fn new(spec: &UnitSpec, replica: usize) -> Result<Self, BootlineError> {
        let program = spec
            .config
            .get("program")
            .and_then(|v| v.as_str())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                BootlineError::BuildError(format!("Unit {}: program not specified", spec.name))
            })?
            .to_string();

        let args = match spec.config.get("args") {
            None => Vec::new(),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                BootlineError::BuildError(format!("Unit {}: invalid args: {}", spec.name, e))
            })?,
        };

        let env = match spec.config.get("env") {
            None => HashMap::new(),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                BootlineError::BuildError(format!("Unit {}: invalid env: {}", spec.name, e))
            })?,
        };

        Ok(Self {
            name: spec.name.clone(),
            replica,
            program,
            args,
            env,
            child: Mutex::new(None),
        })
    }

    /// OS process ID of the running child, if any
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(|c| c.id())
    }
}

#[async_trait]
impl Unit for CommandUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BootlineError> {
        let mut guard = self.child.lock().await;
        if guard.is_some() {
            return Err(BootlineError::LaunchError(format!(
                "Unit {} #{} already started",
                self.name, self.replica
            )));
        }

        debug!("Spawning {} {:?}", self.program, self.args);
        let child = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .env("BOOTLINE_UNIT", &self.name)
            .env("BOOTLINE_REPLICA", self.replica.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BootlineError::LaunchError(format!(
                    "Unit {} #{}: failed to spawn {}: {}",
                    self.name, self.replica, self.program, e
                ))
            })?;

        info!(
            "Unit {} #{} running {} (pid {:?})",
            self.name,
            self.replica,
            self.program,
            child.id()
        );
        *guard = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BootlineError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                warn!("Unit {} #{} already exited: {}", self.name, self.replica, status);
                Ok(())
            }
            _ => child.kill().await.map_err(|e| {
                BootlineError::StopError(format!("Unit {} #{}: {}", self.name, self.replica, e))
            }),
        }
    }
}
