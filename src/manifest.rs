// src/manifest.rs

//! Gravelfile parsing
//!
//! A Gravelfile is a small YAML mapping describing one package: lifecycle
//! hooks (`preinstall`, `postinstall`, `preupgrade`, `postupgrade`,
//! `first-preinstall`, `start`) map to shell commands; `requires` and
//! `requires-apt` list dependencies; `symlinks` declares links to create
//! after unpacking.
//!
//! ```yaml
//! start: bin/server --foreground
//! postinstall: bin/migrate
//! requires: base-runtime
//! requires-apt: libpq5 curl
//! symlinks:
//!   - [bin/ctl, /usr/local/bin/web-ctl]
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed package descriptor; immutable after load
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Whitespace-separated package names installed (in order) before this
    /// package's own hooks run
    #[serde(default)]
    requires: Option<String>,

    /// Whitespace-separated system package names handed to the external
    /// installer in a single call
    #[serde(default, rename = "requires-apt")]
    requires_apt: Option<String>,

    /// `[source-relative, target-absolute]` pairs recreated on every
    /// install and upgrade
    #[serde(default)]
    symlinks: Vec<(String, PathBuf)>,

    /// Everything else in the mapping: hook name to shell command
    #[serde(flatten)]
    hooks: BTreeMap<String, String>,
}

impl Manifest {
    /// Load the Gravelfile inside a package directory
    pub fn load(name: &str, package_dir: &Path) -> Result<Self> {
        let path = package_dir.join("Gravelfile");
        let raw = fs::read_to_string(&path).map_err(|e| Error::ManifestLoad {
            name: name.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        serde_yaml::from_str(&raw).map_err(|e| Error::ManifestLoad {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Shell command for a hook, if the Gravelfile declares one
    pub fn hook(&self, name: &str) -> Option<&str> {
        self.hooks.get(name).map(String::as_str)
    }

    /// Command supervised as the package's service, if any
    pub fn start(&self) -> Option<&str> {
        self.hook("start")
    }

    /// Declared package dependencies, in declaration order
    pub fn requires(&self) -> Vec<&str> {
        self.requires
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Declared system package dependencies
    pub fn requires_apt(&self) -> Vec<&str> {
        self.requires_apt
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Declared symlinks as (source-relative, target-absolute) pairs
    pub fn symlinks(&self) -> &[(String, PathBuf)] {
        &self.symlinks
    }
}
