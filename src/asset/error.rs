//! Asset resolution errors
//!
//! I/O failures are folded into the outcomes the delivery layer maps to
//! status codes.

use std::io;
use thiserror::Error;

/// Why an asset could not be resolved
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found")]
    NotFound,
    /// Path escapes the root, or the backend denied access
    #[error("access to asset forbidden")]
    Forbidden,
    #[error("asset is a directory")]
    IsDirectory,
    /// Request path could not be decoded into a name
    #[error("invalid asset path")]
    InvalidPath,
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            io::ErrorKind::IsADirectory => Self::IsDirectory,
            _ => Self::Io(err),
        }
    }
}
