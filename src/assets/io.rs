use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::errors::{CubismError, Result};

/// Source of raw asset bytes.
///
/// Every file a model references is fetched through this trait; parsing is done
/// by the caller.
pub trait AssetReader: Send + Sync {
    /// Reads the whole asset at `uri`.
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CubismError::AssetNotFound(uri.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serves assets from memory, keyed by uri.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetReader {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(uri.into(), bytes.into());
    }

    #[must_use]
    pub fn with(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(uri, bytes);
        self
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }
}

impl AssetReader for MemoryAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        self.files
            .get(uri)
            .cloned()
            .ok_or_else(|| CubismError::AssetNotFound(uri.to_owned()))
    }
}

/// Joins `relative` onto the directory part of `base`, using `/` separators.
#[must_use]
pub fn resolve_uri(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(pos) => format!("{}/{relative}", &base[..pos]),
        None => relative.to_owned(),
    }
}
