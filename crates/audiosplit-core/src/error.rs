//! Error type shared by every stage of a splitting run.

use std::path::PathBuf;
use thiserror::Error;

/// Terminal failure of a splitting run.
///
/// None of these are retried. The size-driven shrink is a normal outcome,
/// not an error.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// Bad parameters or a missing input, detected before any decoding.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The source file could not be probed or decoded.
    #[error("failed to decode '{}': {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Directory creation or file write/measure failure.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder rejected a slice or exited unsuccessfully.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// The run was cancelled between windows.
    #[error("splitting cancelled")]
    Cancelled,
}

impl ChunkerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T, E = ChunkerError> = std::result::Result<T, E>;
