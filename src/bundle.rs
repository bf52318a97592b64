// src/bundle.rs

//! Bundle verification and extraction
//!
//! A `.gravelpkg` bundle is an OpenPGP-signed message whose payload is a
//! gzip-compressed tarball of the package's files. Verification runs the
//! `gpg` binary against the configured key ring and must succeed before any
//! extraction is attempted; the payload of an unverified bundle is never
//! opened.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Signature verifier over a GnuPG home directory
pub struct Verifier {
    gpghome: PathBuf,
}

impl Verifier {
    pub fn new(gpghome: &Path) -> Self {
        Self {
            gpghome: gpghome.to_path_buf(),
        }
    }

    /// Verify a bundle's signature and return the plaintext payload
    ///
    /// Any gpg failure, including an unknown or invalid signature, aborts
    /// with `Verification` before the payload is handed to the caller.
    pub fn verify_and_open(&self, bundle: &Path) -> Result<Vec<u8>> {
        debug!("bundle {} sha256 {}", bundle.display(), sha256_hex(bundle)?);

        let output = Command::new("gpg")
            .arg("--homedir")
            .arg(&self.gpghome)
            .arg("--batch")
            .arg("--quiet")
            .arg("--decrypt")
            .arg(bundle)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Verification(format!("cannot run gpg: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Verification(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(output.stdout)
    }
}

/// Extract a verified payload into the package directory, creating it and
/// any parents as needed; files already present are overwritten in place
pub fn unpack(plaintext: &[u8], dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(plaintext));
    archive
        .unpack(dest)
        .map_err(|e| Error::Unpack(format!("extracting into {}: {}", dest.display(), e)))
}

fn sha256_hex(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, *path, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn gpg_available() -> bool {
        Command::new("gpg")
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .is_ok_and(|output| output.status.success())
    }

    #[test]
    fn test_unpack_round_trip() {
        let payload = tarball(&[
            ("Gravelfile", b"start: bin/server\n"),
            ("bin/server", b"#!/bin/sh\nsleep 1\n"),
        ]);

        let dest = tempfile::tempdir().unwrap();
        unpack(&payload, dest.path()).unwrap();

        assert_eq!(
            fs::read(dest.path().join("Gravelfile")).unwrap(),
            b"start: bin/server\n"
        );
        assert_eq!(
            fs::read(dest.path().join("bin/server")).unwrap(),
            b"#!/bin/sh\nsleep 1\n"
        );
    }

    #[test]
    fn test_unpack_creates_missing_parents() {
        let scratch = tempfile::tempdir().unwrap();
        let dest = scratch.path().join("deep/package/dir");
        unpack(&tarball(&[("a", b"1")]), &dest).unwrap();
        assert_eq!(fs::read(dest.join("a")).unwrap(), b"1");
    }

    #[test]
    fn test_unpack_overwrites_in_place() {
        let dest = tempfile::tempdir().unwrap();
        unpack(&tarball(&[("a", b"old")]), dest.path()).unwrap();
        unpack(&tarball(&[("a", b"new")]), dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("a")).unwrap(), b"new");
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let dest = tempfile::tempdir().unwrap();
        let result = unpack(b"this is not a tarball", dest.path());
        assert!(matches!(result, Err(Error::Unpack(_))));
    }

    #[test]
    fn test_verify_rejects_unsigned_data() {
        if !gpg_available() {
            eprintln!("gpg not found, skipping");
            return;
        }

        let gpghome = tempfile::tempdir().unwrap();
        let bundle = tempfile::NamedTempFile::new().unwrap();
        fs::write(bundle.path(), b"not a signed message").unwrap();

        let verifier = Verifier::new(gpghome.path());
        let result = verifier.verify_and_open(bundle.path());
        assert!(matches!(result, Err(Error::Verification(_))));
    }
}
