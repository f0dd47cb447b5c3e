//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution and directory operations.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Could not determine where the executable lives.
    #[error("Cannot determine executable location: {0}")]
    NoExecutable(String),

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// The platform has no bundled runtime layout.
    #[error("Unsupported platform for bundled Java runtime: {0}")]
    UnsupportedPlatform(&'static str),
}
