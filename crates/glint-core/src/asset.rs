//! Asset loading
//!
//! Font bundles are fetched through an [`AssetSource`], a blocking
//! collaborator that maps a path to raw bytes. Parsing the bytes is the
//! [`bundle`](crate::bundle) module's job.

use std::path::{Path, PathBuf};

use crate::{Error, ErrorKind, Result};

/// Asset data source. Given a path, loads the raw bytes.
pub trait AssetSource {
    /// Loads the raw asset data from the specified path.
    fn load(&self, path: &Path) -> Result<Vec<u8>>;
}

/// An [`AssetSource`] that loads data from files inside a root directory.
///
/// Note that paths cannot escape the specified root directory.
#[derive(Debug)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    /// Creates a [`FileAssetSource`] with a specified root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`] in case of an IO error, such as `not found`,
    /// `permission denied`, etc.
    ///
    /// Returns [`ErrorKind::InvalidPath`] if the provided path does not point
    /// to a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<FileAssetSource> {
        let root = root.into().canonicalize()?;

        if !root.is_dir() {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                "asset root must be a directory",
            ));
        }

        Ok(FileAssetSource { root })
    }
}

impl AssetSource for FileAssetSource {
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let mut file_path = self.root.clone();
        file_path.push(path);

        let file_path = file_path.canonicalize()?;

        if !file_path.starts_with(&self.root) {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                "path escapes asset root directory",
            ));
        }

        let data = std::fs::read(file_path)?;
        Ok(data)
    }
}

/// An [`AssetSource`] backed by an in-memory map, for tests and embedded
/// resources.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    entries: Vec<(PathBuf, Vec<u8>)>,
}

impl MemoryAssetSource {
    pub fn new() -> MemoryAssetSource {
        MemoryAssetSource::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, data: Vec<u8>) {
        self.entries.push((path.into(), data));
    }
}

impl AssetSource for MemoryAssetSource {
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ResourceMissing,
                    format!("no asset at {}", path.display()),
                )
            })
    }
}
