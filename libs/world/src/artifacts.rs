//! Built executables and lifecycle bundles, keyed by component name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Component name to executable path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuiltExecutables(BTreeMap<String, PathBuf>);

impl BuiltExecutables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.0.insert(name.into(), path.into());
    }

    /// Path of a component's executable, or an error naming it.
    pub fn get(&self, name: &str) -> Result<&Path, WorldError> {
        self.0
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| WorldError::MissingExecutable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Lifecycle name to `.tgz` path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuiltLifecycles(BTreeMap<String, PathBuf>);

impl BuiltLifecycles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.0.insert(name.into(), path.into());
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.0.get(name).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Everything a component maker launches from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltArtifacts {
    pub executables: BuiltExecutables,
    pub lifecycles: BuiltLifecycles,
    /// Directory holding the `healthcheck` binary, when built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<PathBuf>,
}

impl BuiltArtifacts {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
