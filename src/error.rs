// src/error.rs

use thiserror::Error;

/// Core error types for Gravel
#[derive(Error, Debug)]
pub enum Error {
    /// No bundle for the requested package exists in the configured source
    #[error("package {0} not found")]
    PackageNotFound(String),

    /// Transport failure while retrieving a bundle
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Bundle signature invalid or verification could not run
    #[error("verification failed: {0}")]
    Verification(String),

    /// Archive extraction failure
    #[error("unpack failed: {0}")]
    Unpack(String),

    /// Missing or unparseable Gravelfile
    #[error("cannot load Gravelfile for {name}: {reason}")]
    ManifestLoad { name: String, reason: String },

    /// A lifecycle hook exited non-zero
    #[error("trigger {hook} failed with status {status}")]
    TriggerFailed { hook: String, status: i32 },

    /// The external system package installer exited non-zero
    #[error("system dependency install failed: {0}")]
    SystemDependency(String),

    /// Missing or unparseable config.yaml
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using Gravel's Error type
pub type Result<T> = std::result::Result<T, Error>;
