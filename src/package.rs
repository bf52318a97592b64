// src/package.rs

//! On-disk package instances and trigger execution
//!
//! A `Package` is a transient view over `<home>/<name>`: the durable state
//! is the directory, its Gravelfile, and the `.installed` marker, not this
//! struct. Triggers run as child processes to completion; the child replaces
//! itself with the hook command (`exec`), so the recorded exit status is the
//! hook's own.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use std::env;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// Environment variable carrying the absolute path of the installer's own
/// entry point, injected into trigger and start processes
pub const INSTALLER_ENV: &str = "INSTALLER";

/// `INSTALLER` suffixed with the package name, so a hook script can invoke
/// installer operations scoped to its own package
pub const INSTALLER_PKG_ENV: &str = "INSTALLER_PKG";

/// One named package on disk: its directory plus the loaded Gravelfile
pub struct Package {
    pub name: String,
    pub path: PathBuf,
    pub manifest: Manifest,
}

impl Package {
    /// Open `<home>/<name>` and load its Gravelfile
    pub fn open(config: &Config, name: &str) -> Result<Self> {
        let path = config.package_dir(name);
        let manifest = Manifest::load(name, &path)?;
        Ok(Self {
            name: name.to_string(),
            path,
            manifest,
        })
    }

    /// Run a lifecycle hook to completion
    ///
    /// A hook absent from the Gravelfile is a silent no-op. Otherwise the
    /// command runs through `sh -c "exec ..."` with the package directory as
    /// working directory and the identity variables in the environment; a
    /// non-zero exit aborts the caller with `TriggerFailed`.
    pub fn trigger(&self, hook: &str) -> Result<()> {
        let Some(command) = self.manifest.hook(hook) else {
            return Ok(());
        };
        info!("running trigger {} for {}...", hook, self.name);

        let (installer, installer_pkg) = self.identity_env()?;
        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("exec {}", command))
            .current_dir(&self.path)
            .env(INSTALLER_ENV, installer)
            .env(INSTALLER_PKG_ENV, installer_pkg)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::TriggerFailed {
                hook: hook.to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }

    /// Identity variables exposed to hook and start processes
    pub(crate) fn identity_env(&self) -> Result<(String, String)> {
        let installer = env::current_exe()?.display().to_string();
        let installer_pkg = format!("{} {}", installer, self.name);
        Ok((installer, installer_pkg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn package_with(gravelfile: &str) -> (tempfile::TempDir, Package) {
        let home = tempfile::tempdir().unwrap();
        fs::write(
            home.path().join("config.yaml"),
            "repo: /srv/packages\ngpghome: /g\nlog: /l\nrun: /r\n",
        )
        .unwrap();
        let config = Config::load(home.path()).unwrap();

        let dir = home.path().join("pkg");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Gravelfile"), gravelfile).unwrap();

        let package = Package::open(&config, "pkg").unwrap();
        (home, package)
    }

    #[test]
    fn test_absent_hook_is_noop() {
        let (_home, package) = package_with("start: bin/server\n");
        package.trigger("postinstall").unwrap();
    }

    #[test]
    fn test_trigger_runs_in_package_dir() {
        let (_home, package) = package_with("postinstall: touch done\n");
        package.trigger("postinstall").unwrap();
        assert!(package.path.join("done").exists());
    }

    #[test]
    fn test_trigger_sees_identity_env() {
        let (_home, package) =
            package_with("postinstall: printenv INSTALLER_PKG > identity\n");
        package.trigger("postinstall").unwrap();

        let identity = fs::read_to_string(package.path.join("identity")).unwrap();
        let expected = format!(
            "{} pkg",
            env::current_exe().unwrap().display()
        );
        assert_eq!(identity.trim(), expected);
    }

    #[test]
    fn test_failed_trigger_carries_hook_and_status() {
        // `exec exit` is not a command, so the hook delegates to a shell.
        let (_home, package) = package_with("preinstall: sh -c 'exit 3'\n");
        let result = package.trigger("preinstall");
        match result {
            Err(Error::TriggerFailed { hook, status }) => {
                assert_eq!(hook, "preinstall");
                assert_eq!(status, 3);
            }
            other => panic!("expected TriggerFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_without_gravelfile() {
        let home = tempfile::tempdir().unwrap();
        fs::write(
            home.path().join("config.yaml"),
            "repo: /srv/packages\ngpghome: /g\nlog: /l\nrun: /r\n",
        )
        .unwrap();
        let config = Config::load(home.path()).unwrap();
        fs::create_dir_all(config.package_dir("empty")).unwrap();

        let result = Package::open(&config, "empty");
        assert!(matches!(result, Err(Error::ManifestLoad { .. })));
    }
}
