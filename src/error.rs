use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No per-user data directory could be resolved for this platform
    #[error("could not determine a per-user data directory (is HOME set?)")]
    DataDir,

    #[error("failed to create profile directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save profile to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("level {0} not found (valid levels are 1-5)")]
    LevelNotFound(u32),

    #[error("word list '{0}' is missing or malformed")]
    WordList(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
