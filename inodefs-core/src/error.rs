//! Error types for the inode filesystem.

use thiserror::Error;

/// Errors that can occur while operating on the emulated filesystem.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No such entry: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("No free inodes")]
    ResourceExhausted,

    #[error("Inode 0 is not a valid directory")]
    InvalidBootstrap,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FsError {
    /// Whether this error should stop the process instead of being reported
    /// back to the command loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FsError::InvalidBootstrap | FsError::Configuration(_))
    }
}

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
