//! Registry files for saving and loading custom macro tables.
//!
//! Sites that need macros beyond the built-in areaDetector table describe them
//! in JSON and pass the file with `--registry`:
//!
//! ```json
//! {
//!   "required": [ { "name": "EPICS_BASE", "default": "/opt/epics/base" } ],
//!   "optional": [ { "name": "WITH_HDF5", "default": "YES" } ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::registry::{MacroEntry, MacroRegistry};

/// One macro in a registry file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFileEntry {
    pub name: String,
    #[serde(default)]
    pub default: String,
}

/// On-disk form of a `MacroRegistry`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub required: Vec<RegistryFileEntry>,
    #[serde(default)]
    pub optional: Vec<RegistryFileEntry>,
}

impl RegistryFile {
    /// Snapshot of an existing registry
    pub fn from_registry(registry: &MacroRegistry) -> Self {
        let convert = |entries: &[MacroEntry]| -> Vec<RegistryFileEntry> {
            entries
                .iter()
                .map(|e| RegistryFileEntry {
                    name: e.name.clone(),
                    default: e.default_value.clone(),
                })
                .collect()
        };
        Self {
            required: convert(registry.required()),
            optional: convert(registry.optional()),
        }
    }

    /// Save the registry to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize registry to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write registry to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load a registry from a JSON file.
    ///
    /// Read and parse failures surface as `ConfigError::InvalidRegistry`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::invalid_registry(e.to_string()))
            .with_context(|| format!("Failed to read registry from {:?}", path.as_ref()))?;

        let file: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid_registry(e.to_string()))
            .context("Failed to parse registry JSON")?;

        Ok(file)
    }

    /// Validate and convert into a `MacroRegistry`
    pub fn into_registry(self) -> Result<MacroRegistry> {
        if self.required.is_empty() && self.optional.is_empty() {
            return Err(ConfigError::invalid_registry("registry file declares no macros").into());
        }
        let required = self
            .required
            .into_iter()
            .map(|e| MacroEntry::required(e.name, e.default))
            .collect();
        let optional = self
            .optional
            .into_iter()
            .map(|e| MacroEntry::optional(e.name, e.default))
            .collect();

        Ok(MacroRegistry::new(required, optional)?)
    }
}

/// Load the registry named on the command line, or the built-in table
pub fn load_registry(path: Option<&Path>) -> Result<MacroRegistry> {
    match path {
        Some(path) => RegistryFile::load_from_file(path)?
            .into_registry()
            .with_context(|| format!("Invalid registry in {:?}", path)),
        None => Ok(MacroRegistry::area_detector()),
    }
}
