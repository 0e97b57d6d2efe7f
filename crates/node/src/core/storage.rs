//! Local catalog of the files this node owns.

use crate::error::RingError;
use crate::store::{FileStore, StoreError};
use common::FileRecord;
use hash_ring::HashCoordinate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Versioned create-or-overwrite over a [`FileStore`].
///
/// The catalog is memory only and starts empty on every process start. It
/// holds metadata; content stays in the store.
pub struct FileCatalog {
    records: Mutex<HashMap<HashCoordinate, FileRecord>>,
    store: Arc<dyn FileStore>,
}

impl FileCatalog {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        FileCatalog {
            records: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Stores `content` under `key`.
    ///
    /// A new key starts at version 0, each overwrite adds exactly one. The
    /// record only changes after the store accepted the bytes.
    pub async fn write(
        &self,
        key: &HashCoordinate,
        filename: &str,
        content: &[u8],
    ) -> Result<FileRecord, RingError> {
        let mut records = self.records.lock().await;

        let record = match records.get(key) {
            Some(existing) => existing.next_version(filename),
            None => FileRecord::new(filename),
        };

        self.store.put(key, content).await?;
        records.insert(*key, record.clone());
        Ok(record)
    }

    /// Returns the record and content stored under `key`.
    pub async fn read(
        &self,
        key: &HashCoordinate,
        filename: &str,
    ) -> Result<(FileRecord, Vec<u8>), RingError> {
        let records = self.records.lock().await;

        let record = records
            .get(key)
            .cloned()
            .ok_or_else(|| RingError::NotFound(filename.to_string()))?;

        let content = match self.store.get(key).await {
            Ok(content) => content,
            // catalogued but gone from disk
            Err(StoreError::Missing(_)) => return Err(RingError::NotFound(filename.to_string())),
            Err(e) => return Err(e.into()),
        };

        Ok((record, content))
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DiskStore, MemoryStore};
    use hash_ring::hash_key;

    /// A store whose writes always fail.
    struct BrokenStore;

    #[tonic::async_trait]
    impl FileStore for BrokenStore {
        async fn put(&self, _key: &HashCoordinate, _content: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        async fn get(&self, key: &HashCoordinate) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Missing(*key))
        }
    }

    #[tokio::test]
    async fn test_versions_count_up_from_zero() {
        let catalog = FileCatalog::new(Arc::new(MemoryStore::new()));
        let key = hash_key("report.txt");

        for expected in 0..4 {
            let record = catalog.write(&key, "report.txt", b"draft").await.unwrap();
            assert_eq!(record.version, expected);
            assert_eq!(record.filename, "report.txt");
        }
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn test_read_returns_latest_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        let catalog = FileCatalog::new(Arc::new(store));
        let key = hash_key("notes.md");

        catalog.write(&key, "notes.md", b"v0").await.unwrap();
        catalog.write(&key, "notes.md", b"v1").await.unwrap();

        let (record, content) = catalog.read(&key, "notes.md").await.unwrap();
        assert_eq!(record, FileRecord { filename: "notes.md".into(), version: 1 });
        assert_eq!(content, b"v1");
    }

    #[tokio::test]
    async fn test_read_unknown_file() {
        let catalog = FileCatalog::new(Arc::new(MemoryStore::new()));
        assert!(catalog.is_empty().await);
        let err = catalog.read(&hash_key("ghost"), "ghost").await.unwrap_err();
        assert!(matches!(err, RingError::NotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_version() {
        let catalog = FileCatalog::new(Arc::new(BrokenStore));
        let key = hash_key("a.txt");

        assert!(matches!(
            catalog.write(&key, "a.txt", b"x").await,
            Err(RingError::Storage(_))
        ));
        assert!(catalog.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_overwrites_have_no_gaps() {
        let catalog = Arc::new(FileCatalog::new(Arc::new(MemoryStore::new())));
        let key = hash_key("shared.txt");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let catalog = Arc::clone(&catalog);
            handles.push(tokio::spawn(async move {
                catalog.write(&key, "shared.txt", b"x").await.unwrap().version
            }));
        }

        let mut versions = Vec::new();
        for handle in handles {
            versions.push(handle.await.unwrap());
        }
        versions.sort_unstable();
        assert_eq!(versions, (0..16).collect::<Vec<u64>>());
    }
}
