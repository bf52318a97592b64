// src/config.rs

//! Installer configuration
//!
//! One `Config` is loaded from `<home>/config.yaml` at startup and passed by
//! reference to every component; there is no ambient global state.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the package home directory
pub const HOME_ENV: &str = "GRAVELHOME";

/// Package home used when `GRAVELHOME` is unset
pub const DEFAULT_HOME: &str = "/gravel/pkg";

/// Process-wide installer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Package home directory; not part of config.yaml, injected at load
    #[serde(skip)]
    pub home: PathBuf,

    /// Package source: `ssh://host[:port]`, `http(s)://...`, or a bare
    /// local directory path
    pub repo: String,

    /// GnuPG home directory holding the verification key ring
    pub gpghome: PathBuf,

    /// Directory receiving per-package service logs (`<log>/<name>.log`)
    pub log: PathBuf,

    /// Directory receiving pid records (`<run>/<name>.pid`)
    pub run: PathBuf,

    /// Optional SSH identity file for the `ssh://` source
    #[serde(default)]
    pub ssh_key: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `<home>/config.yaml`
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join("config.yaml");
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: Config = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Resolve the package home from the environment, falling back to the
    /// fixed default path
    pub fn resolve_home() -> PathBuf {
        env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME))
    }

    /// Directory holding one package's unpacked files
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.home.join(name)
    }

    /// Installed-marker path for one package
    pub fn marker_path(&self, name: &str) -> PathBuf {
        self.home.join(name).join(".installed")
    }

    /// Pid record path for one package
    pub fn pid_path(&self, name: &str) -> PathBuf {
        self.run.join(format!("{}.pid", name))
    }

    /// Service log path for one package
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.log.join(format!("{}.log", name))
    }
}
