use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The mod path does not exist or is not a directory.
    #[error("Mod path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// The mod path has none of the recognized top-level folders.
    #[error("Invalid mod directory '{path}', could not find any of the following directories: {expected}")]
    MissingModSubdir { path: Utf8PathBuf, expected: String },
}
