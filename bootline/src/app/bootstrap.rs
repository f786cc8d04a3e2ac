//! Startup round and failure policy

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::options::AppOptions;
use crate::deploy::coordinator::MultiUnitDeployment;
use crate::deploy::unit::{UnitFactory, UnitLauncher};
use crate::errors::BootlineError;

/// Deploys the configured units and applies the abort-on-failure policy
pub struct Bootstrap {
    options: AppOptions,
    deployment: MultiUnitDeployment,
}

impl Bootstrap {
    pub fn new(
        options: AppOptions,
        factory: Arc<dyn UnitFactory>,
        launcher: Arc<dyn UnitLauncher>,
    ) -> Self {
        Self {
            options,
            deployment: MultiUnitDeployment::new(factory, launcher),
        }
    }

    pub fn deployment(&self) -> &MultiUnitDeployment {
        &self.deployment
    }

    /// Run one deployment round. Returns the number of deployed units.
    ///
    /// On failure with `abort_on_failure` set, every deployed unit is stopped
    /// and [`BootlineError::Aborted`] is returned. Otherwise the round's
    /// failure is returned and healthy units keep running.
    pub async fn start(&self) -> Result<usize, BootlineError> {
        let result = self.deployment.deploy(self.options.units.clone()).await;

        match result.into_result() {
            Ok(total) => Ok(total),
            Err(e) if self.options.abort_on_failure => {
                error!("Shutting down due to one or more errors: {}", e);
                let stopped = self.deployment.undeploy_all().await;
                info!("Stopped {} unit(s)", stopped);
                Err(BootlineError::Aborted(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Stop every deployed unit within the configured shutdown delay.
    ///
    /// Launches still in flight are allowed to finish first so that units
    /// coming up late are stopped as well.
    pub async fn shutdown(&self) -> Result<usize, BootlineError> {
        let delay = self.options.lifecycle.max_shutdown_delay;
        let teardown = async {
            self.deployment.settle().await;
            self.deployment.undeploy_all().await
        };
        match tokio::time::timeout(delay, teardown).await {
            Ok(stopped) => {
                info!("Shutdown complete, stopped {} unit(s)", stopped);
                Ok(stopped)
            }
            Err(_) => {
                warn!("Shutdown timed out after {:?}", delay);
                Err(BootlineError::StopError(format!(
                    "Units did not stop within {:?}",
                    delay
                )))
            }
        }
    }
}
