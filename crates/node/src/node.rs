//! A ring member: routing plus the files it owns.

use crate::core::{FileCatalog, Ownership, PeerClient, Router};
use crate::error::RingError;
use crate::store::FileStore;
use common::FileRecord;
use hash_ring::{hash_key, HashCoordinate, NodeId};
use log::info;
use std::sync::Arc;

/// Ring node.
///
/// Responsible for:
/// - routing lookups for any key
/// - serving reads and writes for the keys it owns, and refusing the rest
pub struct ChordNode {
    router: Router,
    catalog: FileCatalog,
}

impl ChordNode {
    /// Creates a node with an empty membership table.
    ///
    /// # Arguments
    /// * `local` - identity of this node
    /// * `peers` - transport for forwarded lookups
    /// * `store` - byte storage for owned files
    /// * `max_hops` - forwards a lookup may take
    pub fn new(
        local: NodeId,
        peers: Arc<dyn PeerClient>,
        store: Arc<dyn FileStore>,
        max_hops: u32,
    ) -> Self {
        ChordNode {
            router: Router::new(local, peers, max_hops),
            catalog: FileCatalog::new(store),
        }
    }

    pub fn local(&self) -> &NodeId {
        self.router.local()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    /// Installs the ring membership. Returns the number of peers kept.
    pub fn set_membership(&self, nodes: Vec<NodeId>) -> usize {
        let count = self.router.set_membership(nodes);
        info!("membership set: {} peer(s) known to {}", count, self.local());
        count
    }

    /// Writes `filename` if this node owns it.
    pub async fn write_file(&self, filename: &str, content: &[u8]) -> Result<FileRecord, RingError> {
        self.write_at(&hash_key(filename), filename, content).await
    }

    /// Reads `filename` if this node owns it.
    pub async fn read_file(&self, filename: &str) -> Result<(FileRecord, Vec<u8>), RingError> {
        self.read_at(&hash_key(filename), filename).await
    }

    /// Like [`write_file`](Self::write_file), for a caller that already
    /// placed the file on the ring at `key`.
    pub async fn write_at(
        &self,
        key: &HashCoordinate,
        filename: &str,
        content: &[u8],
    ) -> Result<FileRecord, RingError> {
        self.ensure_owner(key, filename).await?;
        let record = self.catalog.write(key, filename, content).await?;
        info!("stored {} at version {}", filename, record.version);
        Ok(record)
    }

    /// Like [`read_file`](Self::read_file), with the ring key given.
    pub async fn read_at(
        &self,
        key: &HashCoordinate,
        filename: &str,
    ) -> Result<(FileRecord, Vec<u8>), RingError> {
        self.ensure_owner(key, filename).await?;
        self.catalog.read(key, filename).await
    }

    // ownership is resolved per call and never kept between calls
    async fn ensure_owner(&self, key: &HashCoordinate, filename: &str) -> Result<(), RingError> {
        let Ownership { owner, is_local } = self.router.resolve_owner(key).await?;
        if is_local {
            Ok(())
        } else {
            info!("refusing {}: owned by {}", filename, owner);
            Err(RingError::NotOwner {
                filename: filename.to_string(),
                owner,
            })
        }
    }
}
