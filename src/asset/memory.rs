//! In-memory asset source
//!
//! Holds assets in a map keyed by normalized path. Directories are implied by
//! the keys: `docs` is a directory as soon as any `docs/...` entry exists.

use super::{Asset, AssetError, AssetSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;

/// Asset source backed by a map of byte buffers
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset, builder style
    ///
    /// Names that escape the root are ignored.
    #[must_use]
    pub fn with_asset(mut self, name: &str, data: impl Into<Bytes>) -> Self {
        self.insert(name, data);
        self
    }

    /// Add or replace an asset, returning `false` if the name escapes the root
    pub fn insert(&mut self, name: &str, data: impl Into<Bytes>) -> bool {
        match normalize_key(name) {
            Ok(key) if !key.is_empty() => {
                self.files.insert(key, data.into());
                true
            }
            _ => false,
        }
    }

    fn has_children(&self, key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        let prefix = format!("{key}/");
        self.files.keys().any(|k| k.starts_with(&prefix))
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn resolve(&self, name: &str) -> Result<Asset, AssetError> {
        let key = normalize_key(name)?;
        if let Some(data) = self.files.get(&key) {
            let len = data.len() as u64;
            return Ok(Asset::new(key, Some(len), Box::new(Cursor::new(data.clone()))));
        }
        if self.has_children(&key) {
            return Err(AssetError::IsDirectory);
        }
        Err(AssetError::NotFound)
    }

    async fn is_directory(&self, name: &str) -> Result<bool, AssetError> {
        let key = normalize_key(name)?;
        if self.files.contains_key(&key) {
            return Ok(false);
        }
        if self.has_children(&key) {
            return Ok(true);
        }
        Err(AssetError::NotFound)
    }
}

/// Normalize a request name into a map key, rejecting escapes above the root
fn normalize_key(name: &str) -> Result<String, AssetError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AssetError::Forbidden);
                }
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_asset("/index.html", "<h1>home</h1>")
            .with_asset("css/site.css", "body {}")
            .with_asset("docs/index.html", "<h1>docs</h1>")
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("/a//b/./c.js").unwrap(), "a/b/c.js");
        assert_eq!(normalize_key("a/../b.js").unwrap(), "b.js");
        assert_eq!(normalize_key("/").unwrap(), "");
        assert!(matches!(normalize_key("../x"), Err(AssetError::Forbidden)));
        assert!(matches!(normalize_key("a/../../x"), Err(AssetError::Forbidden)));
    }

    #[test]
    fn test_insert_rejects_escape() {
        let mut source = MemorySource::new();
        assert!(!source.insert("../outside.txt", "x"));
        assert!(!source.insert("/", "x"));
        assert!(source.insert("inside.txt", "x"));
    }

    #[tokio::test]
    async fn test_resolve() {
        let source = source();
        let asset = source.resolve("/css/site.css").await.unwrap();
        assert_eq!(asset.len, Some(7));
        assert_eq!(asset.name, "css/site.css");

        let mut reader = asset.reader;
        let mut buf = String::new();
        reader.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "body {}");
    }

    #[tokio::test]
    async fn test_asset_named_by_key() {
        let source = source();
        let asset = source.resolve("/css/./site.css/").await.unwrap();
        assert_eq!(asset.name, "css/site.css");
        assert_eq!(asset.extension(), Some("css"));
    }

    #[tokio::test]
    async fn test_outcomes() {
        let source = source();
        assert!(matches!(source.resolve("/nope.js").await, Err(AssetError::NotFound)));
        assert!(matches!(source.resolve("/docs").await, Err(AssetError::IsDirectory)));
        assert!(matches!(source.resolve("/").await, Err(AssetError::IsDirectory)));
        assert!(matches!(source.resolve("/../etc/passwd").await, Err(AssetError::Forbidden)));
    }

    #[tokio::test]
    async fn test_is_directory() {
        let source = source();
        assert!(source.is_directory("/").await.unwrap());
        assert!(source.is_directory("/docs/").await.unwrap());
        assert!(!source.is_directory("/css/site.css").await.unwrap());
        assert!(matches!(source.is_directory("/cs").await, Err(AssetError::NotFound)));
    }
}
