//! Unit registry mapping unit kinds to constructors

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::deploy::unit::{Unit, UnitFactory};
use crate::errors::BootlineError;
use crate::models::unit::UnitSpec;
use crate::units::{CommandUnit, DelayUnit, LogUnit};

/// Constructor registered for a unit kind
pub type UnitConstructor =
    Arc<dyn Fn(&UnitSpec, usize) -> Result<Arc<dyn Unit>, BootlineError> + Send + Sync>;

/// Registry of unit constructors, keyed by kind
#[derive(Clone, Default)]
pub struct UnitRegistry {
    constructors: HashMap<String, UnitConstructor>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in unit kinds
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LogUnit::KIND, |spec, replica| {
            Ok(Arc::new(LogUnit::new(spec, replica)?) as Arc<dyn Unit>)
        });
        registry.register(DelayUnit::KIND, |spec, replica| {
            Ok(Arc::new(DelayUnit::new(spec, replica)?) as Arc<dyn Unit>)
        });
        registry.register(CommandUnit::KIND, |spec, replica| {
            Ok(Arc::new(CommandUnit::new(spec, replica)?) as Arc<dyn Unit>)
        });
        registry
    }

    /// Register a constructor, replacing any previous one for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&UnitSpec, usize) -> Result<Arc<dyn Unit>, BootlineError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        debug!("Registering unit kind: {}", kind);
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.constructors.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl UnitFactory for UnitRegistry {
    fn build(&self, spec: &UnitSpec, replica: usize) -> Result<Arc<dyn Unit>, BootlineError> {
        let constructor = self
            .constructors
            .get(spec.kind())
            .ok_or_else(|| BootlineError::UnknownUnit(spec.kind().to_string()))?;
        constructor(spec, replica)
    }
}
