//! Asset source module
//!
//! Resolves logical request paths to readable byte streams. The delivery layer
//! only sees the [`AssetSource`] trait, so any backend (local directory,
//! in-memory map, embedded bundle) can be plugged in.

mod error;
pub mod fs;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use tokio::io::AsyncRead;

pub use error::AssetError;
pub use fs::FileSystemSource;
pub use memory::MemorySource;

/// Owned byte reader handed from a source to the delivery layer
pub type AssetReader = Box<dyn AsyncRead + Send + Unpin>;

/// A successfully resolved resource
///
/// Dropping the asset releases the underlying handle.
pub struct Asset {
    /// Root-relative path the name resolved to, used as the content-type hint
    pub name: String,
    /// Length in bytes, if the source knows it up front
    pub len: Option<u64>,
    /// Reader positioned at the first byte
    pub reader: AssetReader,
}

impl Asset {
    pub fn new(name: impl Into<String>, len: Option<u64>, reader: AssetReader) -> Self {
        Self {
            name: name.into(),
            len,
            reader,
        }
    }

    /// File extension of the resolved name, without the leading dot
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.name.rsplit('/').next()?;
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Backing store for static assets
///
/// Implementations never write responses; they only report outcomes.
/// Every call must re-validate that `name` stays inside the source's root.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Resolve `name` to a readable stream
    ///
    /// Directories are reported as [`AssetError::IsDirectory`] rather than
    /// opened for reading.
    async fn resolve(&self, name: &str) -> Result<Asset, AssetError>;

    /// Report whether `name` denotes a directory, without reading it
    async fn is_directory(&self, name: &str) -> Result<bool, AssetError>;
}

#[async_trait]
impl<S: AssetSource + ?Sized> AssetSource for std::sync::Arc<S> {
    async fn resolve(&self, name: &str) -> Result<Asset, AssetError> {
        (**self).resolve(name).await
    }

    async fn is_directory(&self, name: &str) -> Result<bool, AssetError> {
        (**self).is_directory(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Asset {
        Asset::new(name, None, Box::new(tokio::io::empty()))
    }

    #[test]
    fn test_extension() {
        assert_eq!(asset("/js/app.min.js").extension(), Some("js"));
        assert_eq!(asset("style.css").extension(), Some("css"));
        assert_eq!(asset("/Makefile").extension(), None);
        assert_eq!(asset("/.hidden").extension(), None);
        assert_eq!(asset("/v1.2/README").extension(), None);
        assert_eq!(asset("/trailing.").extension(), None);
    }
}
