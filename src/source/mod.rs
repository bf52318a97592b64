// src/source/mod.rs

//! Package sources
//!
//! A `PackageSource` turns a package name into a local copy of its signed
//! bundle. The backend is picked from the `repo` URL scheme at configuration
//! load: `ssh://` runs `pkgget` on a remote host, `http(s)://` downloads
//! `<repo>/<name>.gravelpkg`, anything else is read as a local directory
//! tree. All backends hand back a `FetchedBundle` whose temporary file is
//! deleted when the handle is dropped, so later pipeline stages own a stable
//! path for exactly as long as they need it.

mod http;
mod local;
mod ssh;

pub use http::HttpSource;
pub use local::LocalSource;
pub use ssh::SshSource;

use crate::config::Config;
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of a package's bundle within a repository
pub(crate) fn bundle_file_name(name: &str) -> String {
    format!("{}.gravelpkg", name)
}

/// A bundle staged on local storage; the backing temporary file is removed
/// on drop
pub struct FetchedBundle {
    temp: NamedTempFile,
}

impl FetchedBundle {
    fn new() -> Result<Self> {
        Ok(Self {
            temp: NamedTempFile::new()?,
        })
    }

    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut bundle = Self::new()?;
        bundle.temp.write_all(data)?;
        bundle.temp.flush()?;
        Ok(bundle)
    }

    fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    /// Path to the staged bundle bytes
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

/// Fetch backend selected by URL scheme
pub enum PackageSource {
    Local(LocalSource),
    Ssh(SshSource),
    Http(HttpSource),
}

impl PackageSource {
    /// Build the source matching the configured repo URL
    pub fn from_config(config: &Config) -> Result<Self> {
        let repo = config.repo.as_str();
        if repo.starts_with("ssh://") {
            Ok(Self::Ssh(SshSource::parse(repo, config.ssh_key.clone())?))
        } else if repo.starts_with("http://") || repo.starts_with("https://") {
            Ok(Self::Http(HttpSource::new(repo)))
        } else {
            Ok(Self::Local(LocalSource::new(PathBuf::from(repo))))
        }
    }

    /// Retrieve the named package's bundle onto local storage
    pub fn fetch(&self, name: &str) -> Result<FetchedBundle> {
        match self {
            Self::Local(source) => source.fetch(name),
            Self::Ssh(source) => source.fetch(name),
            Self::Http(source) => source.fetch(name),
        }
    }
}
