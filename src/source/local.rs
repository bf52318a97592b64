// src/source/local.rs

//! Local-directory package source

use super::{bundle_file_name, FetchedBundle};
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Package source backed by a directory tree on the local filesystem
///
/// Bundles are looked up both directly (`<dir>/<name>.gravelpkg`) and one
/// level down (`<dir>/*/<name>.gravelpkg`), matching a repository checkout
/// organized by category subdirectories.
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn fetch(&self, name: &str) -> Result<FetchedBundle> {
        let file_name = bundle_file_name(name);
        let mut matches = Vec::new();

        let direct = self.dir.join(&file_name);
        if direct.is_file() {
            matches.push(direct);
        }

        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let candidate = entry.path().join(&file_name);
                if entry.path().is_dir() && candidate.is_file() {
                    matches.push(candidate);
                }
            }
        }

        matches.sort();
        let found = match matches.first() {
            Some(path) => path,
            None => return Err(Error::PackageNotFound(name.to_string())),
        };
        if matches.len() > 1 {
            warn!("found multiple instances of {}", name);
        }

        debug!("fetching {} from {}", name, found.display());

        // Copy into a private temp file so later stages own a stable path
        // even if the repository tree changes underneath them.
        let bundle = FetchedBundle::new()?;
        fs::copy(found, bundle.path())?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn seed(dir: &Path, relative: &str, content: &[u8]) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_not_found() {
        let repo = tempfile::tempdir().unwrap();
        let source = LocalSource::new(repo.path().to_path_buf());
        let result = source.fetch("ghost");
        assert!(matches!(result, Err(Error::PackageNotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_direct_match() {
        let repo = tempfile::tempdir().unwrap();
        seed(repo.path(), "web.gravelpkg", b"direct");

        let source = LocalSource::new(repo.path().to_path_buf());
        let bundle = source.fetch("web").unwrap();
        assert_eq!(fs::read(bundle.path()).unwrap(), b"direct");
    }

    #[test]
    fn test_subdirectory_match() {
        let repo = tempfile::tempdir().unwrap();
        seed(repo.path(), "services/web.gravelpkg", b"nested");

        let source = LocalSource::new(repo.path().to_path_buf());
        let bundle = source.fetch("web").unwrap();
        assert_eq!(fs::read(bundle.path()).unwrap(), b"nested");
    }

    #[test]
    fn test_multiple_matches_pick_first_sorted() {
        let repo = tempfile::tempdir().unwrap();
        seed(repo.path(), "b-tree/web.gravelpkg", b"second");
        seed(repo.path(), "a-tree/web.gravelpkg", b"first");

        let source = LocalSource::new(repo.path().to_path_buf());
        let bundle = source.fetch("web").unwrap();
        assert_eq!(fs::read(bundle.path()).unwrap(), b"first");
    }

    #[test]
    fn test_fetch_survives_repo_deletion() {
        let repo = tempfile::tempdir().unwrap();
        seed(repo.path(), "web.gravelpkg", b"copied");

        let source = LocalSource::new(repo.path().to_path_buf());
        let bundle = source.fetch("web").unwrap();
        fs::remove_file(repo.path().join("web.gravelpkg")).unwrap();
        assert_eq!(fs::read(bundle.path()).unwrap(), b"copied");
    }
}
