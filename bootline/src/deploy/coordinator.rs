//! Multi-unit deployment coordinator
//!
//! Expands unit specs into one launch per replica, wires every launch into a
//! shared [`DeploymentTracker`] and hands back a single [`RoundHandle`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::deploy::completion::{completion_channel, RoundHandle};
use crate::deploy::tracker::DeploymentTracker;
use crate::deploy::unit::{LaunchFuture, Unit, UnitFactory, UnitLauncher};
use crate::errors::BootlineError;
use crate::models::unit::{AggregateResult, DeploymentOutcome, UnitSpec};

/// A unit that deployed successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub name: String,
    pub deployed_at: DateTime<Utc>,
}

struct DeployedUnit {
    record: DeploymentRecord,
    unit: Arc<dyn Unit>,
}

/// Total number of deployments required by `specs`
pub fn total_instances(specs: &[UnitSpec]) -> Result<usize, BootlineError> {
    specs.iter().try_fold(0usize, |total, spec| {
        total.checked_add(spec.instance_count()).ok_or_else(|| {
            BootlineError::ConfigError(format!(
                "Too many deployments in one round: unit {} pushes the total past {}",
                spec.name,
                usize::MAX
            ))
        })
    })
}

/// Deploys a set of units concurrently and reports on the round as a whole
pub struct MultiUnitDeployment {
    factory: Arc<dyn UnitFactory>,
    launcher: Arc<dyn UnitLauncher>,
    deployed: Arc<RwLock<Vec<DeployedUnit>>>,
    launches: Mutex<Vec<JoinHandle<()>>>,
}

impl MultiUnitDeployment {
    pub fn new(factory: Arc<dyn UnitFactory>, launcher: Arc<dyn UnitLauncher>) -> Self {
        Self {
            factory,
            launcher,
            deployed: Arc::new(RwLock::new(Vec::new())),
            launches: Mutex::new(Vec::new()),
        }
    }

    /// Launch every replica of every spec and return the round's future.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn deploy(&self, specs: Vec<UnitSpec>) -> RoundHandle {
        let total = match total_instances(&specs) {
            Ok(total) => total,
            Err(e) => return reject_round(&specs, e),
        };
        let round_id = uuid::Uuid::new_v4();
        let span = info_span!("deployment_round", round = %round_id, total);
        let (sink, handle) = completion_channel(total);

        if total == 0 {
            span.in_scope(|| info!("No units configured, nothing to deploy"));
            sink.resolve(AggregateResult::Success { total: 0 });
            return handle;
        }

        // A dropped sink resolves the handle as a full failure.
        let tracker = match DeploymentTracker::new(total, sink, span.clone()) {
            Ok(tracker) => Arc::new(tracker),
            Err(e) => {
                span.in_scope(|| error!("Unable to start deployment round: {}", e));
                return handle;
            }
        };

        span.in_scope(|| info!("Deploying {} unit(s) from {} spec(s)", total, specs.len()));

        for spec in &specs {
            for replica in 0..spec.instance_count() {
                match self.begin_launch(spec, replica) {
                    Ok((unit, launch)) => {
                        self.track_launch(unit, launch, tracker.clone(), span.clone());
                    }
                    Err(e) => {
                        tracker.report(DeploymentOutcome::Failure(e));
                    }
                }
            }
        }

        handle
    }

    fn begin_launch(
        &self,
        spec: &UnitSpec,
        replica: usize,
    ) -> Result<(Arc<dyn Unit>, LaunchFuture), BootlineError> {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, BootlineError> {
            let unit = self.factory.build(spec, replica)?;
            let launch = self.launcher.launch(unit.clone())?;
            Ok((unit, launch))
        }));

        attempt.unwrap_or_else(|panic| {
            Err(BootlineError::BuildError(format!(
                "Unit {} #{} panicked during launch: {}",
                spec.name,
                replica,
                panic_message(&*panic)
            )))
        })
    }

    fn track_launch(
        &self,
        unit: Arc<dyn Unit>,
        launch: LaunchFuture,
        tracker: Arc<DeploymentTracker>,
        span: tracing::Span,
    ) {
        let deployed = self.deployed.clone();

        let task = tokio::spawn(
            async move {
                let name = unit.name().to_string();
                let result = AssertUnwindSafe(launch)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(BootlineError::LaunchError(format!(
                            "Unit {} panicked while starting: {}",
                            name,
                            panic_message(&*panic)
                        )))
                    });

                // Record before reporting so the round never resolves ahead of it.
                if let Ok(id) = &result {
                    if !id.is_empty() {
                        deployed.write().await.push(DeployedUnit {
                            record: DeploymentRecord {
                                id: id.clone(),
                                name,
                                deployed_at: Utc::now(),
                            },
                            unit,
                        });
                    }
                }

                tracker.report(result.into());
            }
            .instrument(span),
        );

        let mut launches = self.launches.lock().unwrap_or_else(|p| p.into_inner());
        launches.retain(|launch| !launch.is_finished());
        launches.push(task);
    }

    /// Wait for every launch started by [`deploy`](Self::deploy) to finish,
    /// whether or not anyone still awaits its round.
    pub async fn settle(&self) {
        loop {
            let launches =
                std::mem::take(&mut *self.launches.lock().unwrap_or_else(|p| p.into_inner()));
            if launches.is_empty() {
                return;
            }

            debug!("Waiting for {} launch(es) to settle", launches.len());
            for result in join_all(launches).await {
                if let Err(e) = result {
                    warn!("Launch task did not finish: {}", e);
                }
            }
        }
    }

    /// Units deployed so far, in completion order
    pub async fn deployments(&self) -> Vec<DeploymentRecord> {
        self.deployed
            .read()
            .await
            .iter()
            .map(|d| d.record.clone())
            .collect()
    }

    /// Stop every deployed unit. Returns the number stopped cleanly.
    ///
    /// Launches still in flight are not waited for; call
    /// [`settle`](Self::settle) first to include them.
    pub async fn undeploy_all(&self) -> usize {
        let units: Vec<DeployedUnit> = self.deployed.write().await.drain(..).collect();
        if units.is_empty() {
            return 0;
        }

        info!("Undeploying {} unit(s)", units.len());
        let results = join_all(units.iter().map(|d| d.unit.stop())).await;

        let mut stopped = 0;
        for (deployed, result) in units.iter().zip(results) {
            match result {
                Ok(()) => stopped += 1,
                Err(e) => warn!("Failed to stop {}: {}", deployed.record.id, e),
            }
        }
        stopped
    }
}

/// Resolve a round that cannot be started as a failure of every spec
fn reject_round(specs: &[UnitSpec], reason: BootlineError) -> RoundHandle {
    let total = specs.len();
    let (sink, handle) = completion_channel(total);
    error!("Unable to start deployment round: {}", reason);
    sink.resolve(AggregateResult::Failure {
        failed: total,
        total,
    });
    handle
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
