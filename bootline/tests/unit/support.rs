//! Shared fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bootline::deploy::{LaunchFuture, SpawnLauncher, Unit, UnitLauncher, UnitRegistry};
use bootline::errors::BootlineError;
use bootline::models::unit::UnitSpec;
use futures::FutureExt;

/// Unit driven by its config: `{"fail": bool, "panic": bool, "delay_ms": u64}`
pub struct TestUnit {
    name: String,
    fail: bool,
    panic: bool,
    delay: Duration,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl Unit for TestUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BootlineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic {
            panic!("unit {} exploded", self.name);
        }
        if self.fail {
            return Err(BootlineError::LaunchError(format!("{} refused to start", self.name)));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), BootlineError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Registry with kinds `test`, `broken` (build error) and `panicky` (panics while building)
pub fn test_registry(stops: Arc<AtomicUsize>) -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    registry.register("test", move |spec: &UnitSpec, _replica| {
        let flag = |key: &str| spec.config.get(key).and_then(|v| v.as_bool()).unwrap_or(false);
        Ok(Arc::new(TestUnit {
            name: spec.name.clone(),
            fail: flag("fail"),
            panic: flag("panic"),
            delay: Duration::from_millis(
                spec.config.get("delay_ms").and_then(|v| v.as_u64()).unwrap_or(0),
            ),
            stops: stops.clone(),
        }) as Arc<dyn Unit>)
    });
    registry.register("broken", |spec: &UnitSpec, _replica| {
        Err(BootlineError::BuildError(format!("{} cannot be built", spec.name)))
    });
    registry.register("panicky", |spec: &UnitSpec, _replica| -> Result<Arc<dyn Unit>, BootlineError> {
        panic!("constructor for {} panicked", spec.name)
    });
    registry
}

/// Launcher that rejects units named `rejected` and hands out empty IDs to
/// units whose name starts with `empty`
pub struct TestLauncher {
    inner: SpawnLauncher,
}

impl TestLauncher {
    pub fn new() -> Self {
        Self {
            inner: SpawnLauncher::new(),
        }
    }
}

impl UnitLauncher for TestLauncher {
    fn launch(&self, unit: Arc<dyn Unit>) -> Result<LaunchFuture, BootlineError> {
        if unit.name() == "rejected" {
            return Err(BootlineError::LaunchError("launch rejected".to_string()));
        }
        if unit.name().starts_with("empty") {
            return Ok(async move {
                unit.start().await?;
                Ok(String::new())
            }
            .boxed());
        }
        self.inner.launch(unit)
    }
}

pub fn test_spec(name: &str) -> UnitSpec {
    UnitSpec::new(name).with_kind("test")
}
