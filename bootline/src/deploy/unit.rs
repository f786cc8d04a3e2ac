//! Unit capabilities: building and launching units

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::errors::BootlineError;
use crate::models::unit::UnitSpec;

/// A deployable unit
#[async_trait]
pub trait Unit: Send + Sync {
    /// Unit name, used in deployment IDs and logs
    fn name(&self) -> &str;

    /// Start the unit. Resolves once the unit finished initializing.
    async fn start(&self) -> Result<(), BootlineError>;

    /// Stop the unit
    async fn stop(&self) -> Result<(), BootlineError> {
        Ok(())
    }
}

/// Builds unit instances from their specs
pub trait UnitFactory: Send + Sync {
    fn build(&self, spec: &UnitSpec, replica: usize) -> Result<Arc<dyn Unit>, BootlineError>;
}

/// Future yielding the deployment ID of a launched unit
pub type LaunchFuture = BoxFuture<'static, Result<String, BootlineError>>;

/// Launches built units
pub trait UnitLauncher: Send + Sync {
    /// Begin launching `unit`. An `Err` means the launch was rejected outright.
    fn launch(&self, unit: Arc<dyn Unit>) -> Result<LaunchFuture, BootlineError>;
}

/// Launcher that starts each unit on its own Tokio task
#[derive(Debug, Clone, Default)]
pub struct SpawnLauncher;

impl SpawnLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl UnitLauncher for SpawnLauncher {
    fn launch(&self, unit: Arc<dyn Unit>) -> Result<LaunchFuture, BootlineError> {
        let name = unit.name().to_string();
        let task = tokio::spawn(async move { unit.start().await });

        Ok(async move {
            match task.await {
                Ok(Ok(())) => {
                    let id = format!("{}-{}", name, uuid::Uuid::new_v4());
                    debug!("Unit {} started as {}", name, id);
                    Ok(id)
                }
                Ok(Err(e)) => Err(e),
                Err(e) => Err(BootlineError::LaunchError(format!(
                    "Unit {} task failed: {}",
                    name, e
                ))),
            }
        }
        .boxed())
    }
}
