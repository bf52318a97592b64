// src/installer.rs

//! Top-level install orchestration
//!
//! `install` drives the whole lifecycle for one package: fetch, verify,
//! unpack, symlink refresh, recursive dependency installs, one system
//! installer call, the ordered triggers, the installed-marker commit, and a
//! service restart. Every step is synchronous and every failure aborts the
//! call, leaving the package directory in whatever state the failing step
//! produced and the marker absent, so a partially-installed package is
//! never reported as installed.

use crate::bundle::{self, Verifier};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::package::Package;
use crate::source::PackageSource;
use crate::supervisor::Supervisor;
use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs as unix_fs;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Default external system package installer; the `requires-apt` list is
/// appended to this command
const SYSTEM_INSTALLER: &[&str] = &["sudo", "apt-get", "install", "-qy"];

/// Process-wide orchestrator owning the package source and verifier
pub struct Installer {
    config: Config,
    source: PackageSource,
    verifier: Verifier,
    system_installer: Vec<String>,
}

impl Installer {
    /// Load `<home>/config.yaml` and wire up the source and verifier
    pub fn open(home: &Path) -> Result<Self> {
        Self::with_config(Config::load(home)?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let source = PackageSource::from_config(&config)?;
        let verifier = Verifier::new(&config.gpghome);
        Ok(Self {
            config,
            source,
            verifier,
            system_installer: SYSTEM_INSTALLER.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the external system installer invocation
    ///
    /// This is the seam for environments not managed by apt (and for
    /// tests); the command receives the full `requires-apt` list as
    /// trailing arguments in a single call.
    pub fn set_system_installer(&mut self, command: Vec<String>) {
        self.system_installer = command;
    }

    /// Names of home subdirectories carrying an installed marker
    pub fn list_installed(&self) -> Result<Vec<String>> {
        let mut installed = Vec::new();
        for entry in fs::read_dir(&self.config.home)? {
            let entry = entry?;
            if entry.path().join(".installed").exists() {
                installed.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        installed.sort();
        Ok(installed)
    }

    /// The marker file is the sole source of truth for installation
    pub fn is_installed(&self, name: &str) -> bool {
        self.config.marker_path(name).exists()
    }

    /// Install or upgrade one package, recursing into its dependencies
    ///
    /// An already-installed package with `upgrade` false returns
    /// immediately; nothing is fetched and no trigger fires.
    pub fn install(&self, name: &str, upgrade: bool) -> Result<()> {
        let installed = self.is_installed(name);
        if installed && !upgrade {
            return Ok(());
        }
        info!("installing {}...", name);

        // preupgrade runs against the package as it currently sits on disk.
        if installed {
            Package::open(&self.config, name)?.trigger("preupgrade")?;
        }

        let dest = self.config.package_dir(name);
        {
            let fetched = self.source.fetch(name)?;
            let plaintext = self.verifier.verify_and_open(fetched.path())?;
            bundle::unpack(&plaintext, &dest)?;
        }

        // Re-read the manifest from the freshly unpacked tree.
        let pkg = Package::open(&self.config, name)?;
        self.refresh_symlinks(&pkg)?;

        for dep in pkg.manifest.requires() {
            self.install(dep, false)?;
        }
        self.install_system_deps(&pkg)?;

        if installed {
            pkg.trigger("postupgrade")?;
        } else {
            pkg.trigger("first-preinstall")?;
        }
        pkg.trigger("preinstall")?;

        // Commit point: only now is the package recorded as installed.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.marker_path(name))?;

        pkg.trigger("postinstall")?;
        Supervisor::new(&self.config).restart(&pkg)?;
        Ok(())
    }

    /// Recreate every declared symlink, replacing stale targets
    fn refresh_symlinks(&self, pkg: &Package) -> Result<()> {
        for (source, target) in pkg.manifest.symlinks() {
            match fs::remove_file(target) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            unix_fs::symlink(pkg.path.join(source), target)?;
        }
        Ok(())
    }

    /// One call to the external installer with the whole `requires-apt` list
    fn install_system_deps(&self, pkg: &Package) -> Result<()> {
        let packages = pkg.manifest.requires_apt();
        if packages.is_empty() {
            return Ok(());
        }
        info!("installing system dependencies for {}...", pkg.name);

        let (program, args) = self
            .system_installer
            .split_first()
            .ok_or_else(|| Error::SystemDependency("empty system installer command".into()))?;
        let status = Command::new(program)
            .args(args)
            .args(&packages)
            .status()
            .map_err(|e| Error::SystemDependency(format!("cannot run {}: {}", program, e)))?;

        if !status.success() {
            return Err(Error::SystemDependency(format!(
                "{} exited with {}",
                program, status
            )));
        }
        Ok(())
    }
}
