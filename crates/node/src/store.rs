//! File persistence behind the storage handler.
//!
//! Stores are keyed by ring coordinate, never by the client's filename, so a
//! filename can't escape the data directory.

use hash_ring::HashCoordinate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no content stored for key {0}")]
    Missing(HashCoordinate),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte-level persistence used by a node for the files it owns.
#[tonic::async_trait]
pub trait FileStore: Send + Sync {
    /// Replaces whatever is stored under `key`. Returns once the bytes are
    /// durable.
    async fn put(&self, key: &HashCoordinate, content: &[u8]) -> Result<(), StoreError>;

    async fn get(&self, key: &HashCoordinate) -> Result<Vec<u8>, StoreError>;
}

/// One file per key under a data directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Opens (and creates if needed) the data directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(DiskStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &HashCoordinate) -> PathBuf {
        self.root.join(key.to_hex())
    }
}

#[tonic::async_trait]
impl FileStore for DiskStore {
    async fn put(&self, key: &HashCoordinate, content: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        // write-then-rename
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        let file = tokio::fs::File::open(&tmp).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &HashCoordinate) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::Missing(*key)),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and throwaway nodes.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<HashCoordinate, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[tonic::async_trait]
impl FileStore for MemoryStore {
    async fn put(&self, key: &HashCoordinate, content: &[u8]) -> Result<(), StoreError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*key, content.to_vec());
        Ok(())
    }

    async fn get(&self, key: &HashCoordinate) -> Result<Vec<u8>, StoreError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or(StoreError::Missing(*key))
    }
}
