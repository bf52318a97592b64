// src/supervisor.rs

//! Service supervision via pid files
//!
//! `start` daemonizes the package's declared start command with the classic
//! double fork: the first child detaches stdio and its controlling terminal
//! (`setsid`), the second child records its own pid and then replaces itself
//! with the start command, so the pid record always names the actual service
//! process. The installer reaps only the intermediate child and never waits
//! on the daemon.
//!
//! `stop` is best-effort pid-file discipline: it signals whatever pid the
//! record names, does not wait for exit, does not remove the record, and
//! treats a missing record or dead pid as "already stopped".

use crate::config::Config;
use crate::error::{Error, Result};
use crate::package::{Package, INSTALLER_ENV, INSTALLER_PKG_ENV};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{chdir, dup2, execvpe, fork, getpid, setsid, ForkResult, Pid};
use std::env;
use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;
use tracing::{info, warn};

/// Process supervisor for one installer configuration
pub struct Supervisor<'a> {
    config: &'a Config,
}

impl<'a> Supervisor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Daemonize the package's start command; no-op when the Gravelfile
    /// declares none
    pub fn start(&self, pkg: &Package) -> Result<()> {
        let Some(command) = pkg.manifest.start() else {
            return Ok(());
        };
        info!("starting {}...", pkg.name);

        // Everything fallible happens before the first fork so errors
        // surface in the installer instead of dying silently in a child.
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.log_path(&pkg.name))?;
        let null = File::open("/dev/null")?;
        let pid_path = self.config.pid_path(&pkg.name);
        let argv = shell_argv(command)?;
        let envp = child_env(pkg)?;
        let workdir = pkg.path.clone();

        match unsafe { fork() }.map_err(nix_io)? {
            ForkResult::Parent { child } => {
                // The intermediate child exits as soon as the daemon is
                // forked off; reap it and return without waiting further.
                waitpid(child, None).map_err(nix_io)?;
                Ok(())
            }
            ForkResult::Child => {
                let code = match detach_and_exec(&null, &log, &pid_path, &workdir, &argv, &envp)
                {
                    Ok(()) => 0,
                    Err(_) => 1,
                };
                // Skip atexit handlers inherited from the installer.
                unsafe { nix::libc::_exit(code) }
            }
        }
    }

    /// Signal the recorded service process with SIGTERM
    ///
    /// A missing pid record or already-dead process is silent when
    /// `verbose` is false (the restart path) and a warning when true (an
    /// explicit user stop); neither is an error.
    pub fn stop(&self, pkg: &Package, verbose: bool) -> Result<()> {
        if verbose {
            info!("stopping {}...", pkg.name);
        }

        let pid = match self.read_pid(&pkg.name) {
            Ok(pid) => pid,
            Err(err) => {
                if verbose {
                    warn!("no pid record for {}: {}", pkg.name, err);
                }
                return Ok(());
            }
        };

        if let Err(err) = kill(pid, Signal::SIGTERM) {
            if verbose {
                warn!("cannot signal {} (pid {}): {}", pkg.name, pid, err);
            }
        }
        Ok(())
    }

    /// Stop (quietly) and start again
    pub fn restart(&self, pkg: &Package) -> Result<()> {
        self.stop(pkg, false)?;
        self.start(pkg)
    }

    fn read_pid(&self, name: &str) -> io::Result<Pid> {
        let raw = fs::read_to_string(self.config.pid_path(name))?;
        let pid = raw
            .trim()
            .parse::<i32>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Pid::from_raw(pid))
    }
}

/// Runs in the first forked child: detach, fork again, and become the
/// service
fn detach_and_exec(
    null: &File,
    log: &File,
    pid_path: &Path,
    workdir: &Path,
    argv: &[CString],
    envp: &[CString],
) -> Result<()> {
    dup2(null.as_raw_fd(), 0).map_err(nix_io)?;
    dup2(log.as_raw_fd(), 1).map_err(nix_io)?;
    dup2(log.as_raw_fd(), 2).map_err(nix_io)?;
    setsid().map_err(nix_io)?;

    match unsafe { fork() }.map_err(nix_io)? {
        // Intermediate child is done; its exit reparents the daemon.
        ForkResult::Parent { .. } => Ok(()),
        ForkResult::Child => {
            // The pid record is written before exec, so it names the final
            // service process, not a wrapper.
            fs::write(pid_path, format!("{}\n", getpid()))?;
            chdir(workdir).map_err(nix_io)?;
            execvpe(&argv[0], argv, envp).map_err(nix_io)?;
            unreachable!("execvpe returned without error")
        }
    }
}

/// `sh -c "exec <command>"` as an execvpe argument vector
fn shell_argv(command: &str) -> Result<Vec<CString>> {
    [
        "sh".to_string(),
        "-c".to_string(),
        format!("exec {}", command),
    ]
    .into_iter()
    .map(|arg| CString::new(arg).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e))))
    .collect()
}

/// Inherited environment plus the installer identity variables
fn child_env(pkg: &Package) -> Result<Vec<CString>> {
    let (installer, installer_pkg) = pkg.identity_env()?;
    let mut pairs: Vec<(String, String)> = env::vars()
        .filter(|(key, _)| key != INSTALLER_ENV && key != INSTALLER_PKG_ENV)
        .collect();
    pairs.push((INSTALLER_ENV.to_string(), installer));
    pairs.push((INSTALLER_PKG_ENV.to_string(), installer_pkg));

    pairs
        .into_iter()
        .map(|(key, value)| {
            CString::new(format!("{}={}", key, value))
                .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))
        })
        .collect()
}

fn nix_io(errno: nix::Error) -> Error {
    Error::Io(io::Error::from_raw_os_error(errno as i32))
}
