// src/source/http.rs

//! HTTP(S) package source
//!
//! A plain GET of `<repo>/<name>.gravelpkg`. One attempt, no timeout; a hung
//! server blocks the install, which callers needing bounded time must wrap
//! externally.

use super::{bundle_file_name, FetchedBundle};
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::io;
use tracing::debug;

pub struct HttpSource {
    base: String,
    client: Client,
}

impl HttpSource {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn fetch(&self, name: &str) -> Result<FetchedBundle> {
        let url = format!("{}/{}", self.base, bundle_file_name(name));
        debug!("fetching {} from {}", name, url);

        let mut response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Fetch(format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let mut bundle = FetchedBundle::new()?;
        io::copy(&mut response, bundle.file_mut())
            .map_err(|e| Error::Fetch(format!("reading body from {}: {}", url, e)))?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_fetch() {
        // Port 9 (discard) is not listening on loopback in any sane test
        // environment, so the connection is refused immediately.
        let source = HttpSource::new("http://127.0.0.1:9");
        let result = source.fetch("web");
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let source = HttpSource::new("http://pkg.example.com/");
        assert_eq!(source.base, "http://pkg.example.com");
    }
}
