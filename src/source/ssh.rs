// src/source/ssh.rs

//! SSH package source
//!
//! Fetches bundles by running `pkgget <name>` on the remote host and
//! capturing its stdout. Authentication is whatever the local ssh client is
//! configured for, plus an optional identity file from config.

use super::FetchedBundle;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

const DEFAULT_PORT: u16 = 22;

pub struct SshSource {
    host: String,
    port: u16,
    key: Option<PathBuf>,
}

impl SshSource {
    /// Parse an `ssh://host[:port]` repo URL
    pub fn parse(url: &str, key: Option<PathBuf>) -> Result<Self> {
        let rest = url
            .strip_prefix("ssh://")
            .ok_or_else(|| Error::Config(format!("not an ssh URL: {}", url)))?
            .trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| Error::Config(format!("bad ssh port in {}", url)))?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(Error::Config(format!("no host in ssh URL {}", url)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            key,
        })
    }

    pub fn fetch(&self, name: &str) -> Result<FetchedBundle> {
        debug!("fetching {} from ssh://{}:{}", name, self.host, self.port);

        let mut command = Command::new("ssh");
        command.arg("-p").arg(self.port.to_string());
        if let Some(key) = &self.key {
            command.arg("-i").arg(key);
        }
        command.arg(&self.host).arg("pkgget").arg(name);

        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Fetch(format!("cannot run ssh: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Fetch(format!(
                "pkgget {} on {} failed ({}): {}",
                name,
                self.host,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        FetchedBundle::from_bytes(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_only() {
        let source = SshSource::parse("ssh://pkg.example.com", None).unwrap();
        assert_eq!(source.host, "pkg.example.com");
        assert_eq!(source.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_host_and_port() {
        let source = SshSource::parse("ssh://pkg.example.com:2200/", None).unwrap();
        assert_eq!(source.host, "pkg.example.com");
        assert_eq!(source.port, 2200);
    }

    #[test]
    fn test_parse_bad_port() {
        let result = SshSource::parse("ssh://pkg.example.com:abc", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_empty_host() {
        let result = SshSource::parse("ssh://", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
