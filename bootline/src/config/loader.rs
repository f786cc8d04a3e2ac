//! Loads the configuration document and per-unit config files

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::config::settings::Settings;
use crate::errors::BootlineError;
use crate::filesys::file::File;
use crate::models::unit::UnitSpec;

/// Reads [`Settings`] from a JSON file.
///
/// A unit whose `config` is a string is treated as a path to a separate JSON
/// file. Relative paths resolve against the main document's directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: File,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: File::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Load and validate the settings
    pub async fn load(&self) -> Result<Settings, BootlineError> {
        if !self.file.exists().await {
            return Err(BootlineError::ConfigError(format!(
                "Configuration file not found: {}",
                self.file.path().display()
            )));
        }

        let mut settings: Settings = self.file.read_json().await?;
        let base_dir = self.file.parent_dir();

        for spec in settings.units.iter_mut() {
            validate(spec)?;
            if let Some(path) = spec.config.as_str().map(str::to_owned) {
                spec.config = load_unit_config(&spec.name, &base_dir, &path).await?;
            }
        }

        debug!(
            "Loaded {} unit spec(s) from {}",
            settings.units.len(),
            self.file.path().display()
        );
        Ok(settings)
    }
}

fn validate(spec: &UnitSpec) -> Result<(), BootlineError> {
    if spec.name.trim().is_empty() {
        return Err(BootlineError::ConfigError("Unit name must not be empty".to_string()));
    }
    if spec.kind.as_deref().is_some_and(|k| k.trim().is_empty()) {
        return Err(BootlineError::ConfigError(format!(
            "Unit {}: kind must not be empty",
            spec.name
        )));
    }
    Ok(())
}

async fn load_unit_config(name: &str, base_dir: &Path, path: &str) -> Result<Value, BootlineError> {
    let path = Path::new(path);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    debug!("Loading config for unit {} from {}", name, resolved.display());
    File::new(&resolved).read_json().await.map_err(|e| {
        BootlineError::ConfigError(format!(
            "Unit {}: unable to load config {}: {}",
            name,
            resolved.display(),
            e
        ))
    })
}
