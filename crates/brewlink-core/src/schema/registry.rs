//! Explicit model → device map lookup table.
//!
//! The registry is built from configuration and passed to whoever constructs
//! devices; nothing here consults the environment or a global table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{load_device_schema, DeviceSchema, SchemaError};

/// Maps model identifiers to device map files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRegistry {
    models: BTreeMap<String, PathBuf>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the device map for `model`.
    pub fn register(&mut self, model: impl Into<String>, path: impl Into<PathBuf>) {
        self.models.insert(model.into(), path.into());
    }

    /// The device map path registered for `model`.
    pub fn path_for(&self, model: &str) -> Option<&Path> {
        self.models.get(model).map(PathBuf::as_path)
    }

    /// Registered model identifiers, sorted.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Loads the device map for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownModel`] if `model` is not registered,
    /// otherwise whatever [`load_device_schema`] returns.
    pub fn load(&self, model: &str) -> Result<DeviceSchema, SchemaError> {
        let path = self
            .path_for(model)
            .ok_or_else(|| SchemaError::UnknownModel(model.to_string()))?;
        load_device_schema(path)
    }
}

impl<M, P> FromIterator<(M, P)> for ModelRegistry
where
    M: Into<String>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (M, P)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (model, path) in iter {
            registry.register(model, path);
        }
        registry
    }
}
