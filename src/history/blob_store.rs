use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tracing::debug;

use crate::error::StoreError;

/// Key-value store of string blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `None` when the key has never been written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key succeeds
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

fn is_safe_key(key: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    if key.is_empty() || key.len() > 200 || key.starts_with('.') {
        return false;
    }
    PATTERN
        .get_or_init(|| Regex::new(r"^[\w\-.]+$").ok())
        .as_ref()
        .map(|pattern| pattern.is_match(key))
        .unwrap_or(false)
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blob");
    tmp.set_file_name(format!("{}.tmp", file_name));
    tmp
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(format!("{:?} is not valid UTF-8: {}", path, e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = tmp_path(&path);

        fs::create_dir_all(&self.dir).await?;
        fs::write(&tmp, value.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Wrote blob {:?} ({} bytes)", path, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted blob {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(key).map(|e| e.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.blobs.remove(key);
        Ok(())
    }
}
