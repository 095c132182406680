//! Error types for container and document handling.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing containers.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// The bytes could not be decoded into the expected document.
    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Compression or decompression failed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// The document decoded but violates its expected shape.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
