//! Routing engine
//!
//! Answers "who precedes this key" and "who owns this key" from the local
//! membership table, forwarding to the nearest known peer whenever the
//! answer is not local. Each forward is a blocking nested call; a lookup
//! finishes only when the whole chain does.

use crate::core::peer::PeerClient;
use crate::error::RingError;
use hash_ring::{in_range, HashCoordinate, Membership, NodeId};
use log::debug;

pub use common::DEFAULT_MAX_HOPS;
use std::sync::{Arc, PoisonError, RwLock};

/// Result of resolving a key's owner for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: NodeId,
    pub is_local: bool,
}

/// Routing state of a single node.
///
/// The membership table is swapped as a whole; every lookup works on the
/// snapshot it took when it started.
pub struct Router {
    local: NodeId,
    membership: RwLock<Arc<Membership>>,
    peers: Arc<dyn PeerClient>,
    max_hops: u32,
}

impl Router {
    /// Creates a router for `local` with an empty membership table.
    ///
    /// # Arguments
    /// * `local` - identity of this node
    /// * `peers` - transport used for forwarded lookups
    /// * `max_hops` - forwards allowed before a lookup fails
    pub fn new(local: NodeId, peers: Arc<dyn PeerClient>, max_hops: u32) -> Self {
        Router {
            local,
            membership: RwLock::new(Arc::new(Membership::empty())),
            peers,
            max_hops,
        }
    }

    pub fn local(&self) -> &NodeId {
        &self.local
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// Installs the peer list handed over by bootstrap and returns how many
    /// peers were kept (the local node and duplicates are dropped).
    pub fn set_membership(&self, nodes: Vec<NodeId>) -> usize {
        let table = Membership::new(&self.local, nodes);
        let count = table.len();
        *self
            .membership
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        count
    }

    /// Current membership snapshot.
    pub fn membership(&self) -> Arc<Membership> {
        Arc::clone(&self.membership.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The node immediately clockwise of this one.
    pub fn first_successor(&self) -> Result<NodeId, RingError> {
        self.membership()
            .first_successor()
            .cloned()
            .ok_or(RingError::EmptyRing)
    }

    /// Finds the node whose arc `(node, successor]` holds `key`.
    ///
    /// `hops` is the number of forwards already taken by this lookup.
    ///
    /// With an empty table the node answers with itself. This boot-time
    /// fallback applies here only; every other operation treats an empty
    /// table as [`RingError::EmptyRing`].
    pub async fn find_predecessor(
        &self,
        key: &HashCoordinate,
        hops: u32,
    ) -> Result<NodeId, RingError> {
        let ring = self.membership();
        self.find_predecessor_in(&ring, key, hops).await
    }

    /// Finds the owner of `key`.
    pub async fn find_successor(
        &self,
        key: &HashCoordinate,
        hops: u32,
    ) -> Result<NodeId, RingError> {
        let ring = self.membership();
        let succ = ring.first_successor().ok_or(RingError::EmptyRing)?;

        let pred = self.find_predecessor_in(&ring, key, hops).await?;
        if pred.id == *key {
            // exact coordinate match: the node sitting on the key owns it
            return Ok(pred);
        }
        if pred == self.local {
            return Ok(succ.clone());
        }

        debug!("asking {} for its successor (key {})", pred, key);
        self.peers.get_first_successor(&pred).await
    }

    /// Resolves who owns `key` for a single operation.
    pub async fn resolve_owner(&self, key: &HashCoordinate) -> Result<Ownership, RingError> {
        let owner = self.find_successor(key, 0).await?;
        let is_local = owner == self.local;
        Ok(Ownership { owner, is_local })
    }

    async fn find_predecessor_in(
        &self,
        ring: &Membership,
        key: &HashCoordinate,
        hops: u32,
    ) -> Result<NodeId, RingError> {
        if hops > self.max_hops {
            return Err(RingError::HopLimitExceeded {
                key: *key,
                limit: self.max_hops,
            });
        }

        let succ = match ring.first_successor() {
            Some(succ) => succ,
            None => return Ok(self.local.clone()),
        };

        if in_range(key, &self.local.id, &succ.id)? {
            return Ok(self.local.clone());
        }

        match self.closest_preceding(ring, key)? {
            None => {
                // nothing known between us and the key; let the successor look
                debug!(
                    "forwarding predecessor of {} to successor {} (hop {})",
                    key,
                    succ,
                    hops + 1
                );
                self.peers.find_predecessor(succ, key, hops + 1).await
            }
            Some(nearest) if nearest.same_endpoint(&self.local) => Ok(nearest.clone()),
            Some(nearest) => {
                debug!("forwarding predecessor of {} to {} (hop {})", key, nearest, hops + 1);
                self.peers.find_predecessor(nearest, key, hops + 1).await
            }
        }
    }

    /// The known peer closest to, and not past, `key`, scanning from the far
    /// end of the table back towards this node.
    fn closest_preceding<'a>(
        &self,
        ring: &'a Membership,
        key: &HashCoordinate,
    ) -> Result<Option<&'a NodeId>, RingError> {
        for peer in ring.iter().rev() {
            if in_range(&peer.id, &self.local.id, key)? {
                return Ok(Some(peer));
            }
        }
        Ok(None)
    }
}
