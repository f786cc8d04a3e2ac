//! Deployment module

pub mod completion;
pub mod coordinator;
pub mod registry;
pub mod tracker;
pub mod unit;

pub use completion::{completion_channel, CompletionSink, RoundHandle};
pub use coordinator::{total_instances, DeploymentRecord, MultiUnitDeployment};
pub use registry::{UnitConstructor, UnitRegistry};
pub use tracker::{DeploymentTracker, ReportStatus};
pub use unit::{LaunchFuture, SpawnLauncher, Unit, UnitFactory, UnitLauncher};
