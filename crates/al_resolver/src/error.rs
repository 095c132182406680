//! Error types for patch runs.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Errors from the format and mod-layout crates are converted
//! via `From` impls.
//!
//! Only configuration and finalize errors abort a run. Per-file walk failures and
//! per-actor install failures are collected into the
//! [`PatchReport`](crate::PatchReport) instead.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while patching a mod.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a JSON data file (ignore list, vanilla list).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A container could not be read, decoded or written.
    #[error("Format error: {0}")]
    Format(#[from] al_formats::Error),

    /// The mod root is invalid or its layout could not be read.
    #[error(transparent)]
    ModLayout(#[from] al_mod_core::Error),

    /// Required input is missing or unusable; raised before any processing starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The mod's actor index has mismatched hash and entry lists.
    #[error("Invalid actor index '{path}': {reason}")]
    InvalidIndex { path: Utf8PathBuf, reason: String },

    /// The HTTP client failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote source answered with a non-success status.
    #[error("Failed to fetch actor '{name}': HTTP {status}")]
    Fetch { name: String, status: u16 },

    /// A walk failed and `fail_fast` was set.
    #[error("Failed to process '{path}': {source}")]
    Walk {
        path: Utf8PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Writing the final actor index failed.
    #[error("Failed to finalize actor index '{path}': {source}")]
    Finalize {
        path: Utf8PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A shared lock was poisoned by a panicking worker.
    #[error("Internal state error: {0}")]
    InternalState(String),

    /// Catch-all for errors from remote sources and other collaborators.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
