// src/lib.rs

//! Gravel Package Manager
//!
//! Host-local package manager combined with a small service supervisor.
//! Signed `.gravelpkg` bundles are fetched from a configured source (local
//! directory, SSH, or HTTP), verified, and unpacked under the package home;
//! each package's `Gravelfile` declares lifecycle hooks, dependencies,
//! symlinks, and an optional long-running `start` command supervised through
//! a pid file.
//!
//! # Architecture
//!
//! - Marker-file state: `<home>/<name>/.installed` is the sole record of
//!   installation, touched only after all pre-commit hooks succeed
//! - Synchronous orchestration: dependency installs, triggers, and system
//!   package installs block the enclosing install call
//! - Double-fork supervision: service processes are detached from the
//!   installer and tracked via `<run>/<name>.pid`
//!
//! Concurrent invocations against the same home are not guarded; run one
//! installer at a time.

pub mod bundle;
pub mod config;
mod error;
pub mod installer;
pub mod manifest;
pub mod package;
pub mod source;
pub mod supervisor;

pub use error::{Error, Result};
