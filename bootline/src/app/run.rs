//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::app::bootstrap::Bootstrap;
use crate::app::options::AppOptions;
use crate::deploy::registry::UnitRegistry;
use crate::deploy::unit::SpawnLauncher;
use crate::errors::BootlineError;

/// Deploy all units, then keep them running until `shutdown_signal` fires
pub async fn run(
    options: AppOptions,
    registry: UnitRegistry,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BootlineError> {
    info!("Starting {} unit spec(s)...", options.units.len());

    let bootstrap = Bootstrap::new(options, Arc::new(registry), Arc::new(SpawnLauncher::new()));
    tokio::pin!(shutdown_signal);

    let startup = tokio::select! {
        result = bootstrap.start() => result,
        _ = &mut shutdown_signal => {
            info!("Shutdown signal received during startup, shutting down...");
            bootstrap.shutdown().await?;
            return Err(BootlineError::Aborted("Shutdown requested during startup".to_string()));
        }
    };

    let startup = match startup {
        Ok(total) => {
            info!("Startup complete, {} unit(s) running", total);
            Ok(())
        }
        Err(e @ BootlineError::Aborted(_)) => return Err(e),
        Err(e) => {
            error!("Startup failed, keeping deployed units running: {}", e);
            Err(e)
        }
    };

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");
    bootstrap.shutdown().await?;

    startup
}
