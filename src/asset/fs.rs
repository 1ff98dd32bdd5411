//! Filesystem-backed asset source
//!
//! Serves files from a directory subtree. Every lookup joins the untrusted name
//! onto the root, normalizes the result and rejects anything that lands
//! outside the root before touching the disk.

use super::{Asset, AssetError, AssetSource};
use async_trait::async_trait;
use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};

/// Asset source rooted at a local directory
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    /// Absolute, lexically normalized root
    root: PathBuf,
    /// Root with symlinks resolved, if it existed at construction time
    real_root: Option<PathBuf>,
}

impl FileSystemSource {
    /// Create a source serving `dir`
    ///
    /// Relative directories are taken relative to the current working
    /// directory. The directory does not have to exist yet; lookups simply
    /// report `NotFound` until it does.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let absolute = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };

        let root = normalize(&absolute);
        let real_root = std::fs::canonicalize(&root).ok();
        Ok(Self { root, real_root })
    }

    /// Absolute root this source is confined to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `name` onto the root and enforce containment
    fn locate(&self, name: &str) -> Result<PathBuf, AssetError> {
        if name.contains('\0') {
            return Err(AssetError::InvalidPath);
        }

        let path = join_normalized(&self.root, name);
        if !path.starts_with(&self.root) {
            log::warn!(
                "Path traversal attempt blocked: {name} -> {}",
                path.display()
            );
            return Err(AssetError::Forbidden);
        }
        Ok(path)
    }

    /// Locate `name` and resolve symlinks, re-checking containment on the real path
    ///
    /// Returns the lexical path alongside the real one.
    async fn locate_real(&self, name: &str) -> Result<(PathBuf, PathBuf), AssetError> {
        let path = self.locate(name)?;
        let real = fs::canonicalize(&path).await?;

        let real_root = match &self.real_root {
            Some(p) => Cow::Borrowed(p),
            None => Cow::Owned(fs::canonicalize(&self.root).await?),
        };
        if !real.starts_with(&*real_root) {
            log::warn!(
                "Symlink escape blocked: {name} -> {}",
                real.display()
            );
            return Err(AssetError::Forbidden);
        }
        Ok((path, real))
    }

    /// Root-relative, `/`-separated name of a located path
    fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssetSource for FileSystemSource {
    async fn resolve(&self, name: &str) -> Result<Asset, AssetError> {
        let (path, real) = self.locate_real(name).await?;

        let file = File::open(&real).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(AssetError::IsDirectory);
        }

        log::debug!("Resolved {name} -> {}", real.display());
        let resolved = self.relative_name(&path);
        Ok(Asset::new(resolved, Some(metadata.len()), Box::new(file)))
    }

    async fn is_directory(&self, name: &str) -> Result<bool, AssetError> {
        let (_, real) = self.locate_real(name).await?;
        let metadata = fs::metadata(&real).await?;
        Ok(metadata.is_dir())
    }
}

/// Lexically normalize a path: drop `.`, apply `..`, collapse separators
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Join an untrusted name onto `root`, treating it as relative even if it starts with `/`
///
/// `..` segments may climb above `root`; the caller must check containment.
fn join_normalized(root: &Path, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::ParentDir => {
                path.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    path
}
