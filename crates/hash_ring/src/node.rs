use crate::{hash_key, HashCoordinate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ring participant.
///
/// Two ids are equal only when coordinate, address and port all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub id: HashCoordinate,
    pub address: String,
    pub port: u16,
}

impl NodeId {
    /// Builds the identity of the node listening at `address:port`, placing
    /// it on the ring at `hash("address:port")`.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        let id = hash_key(&format!("{}:{}", address, port));
        NodeId { id, address, port }
    }

    /// Builds an identity with an explicit coordinate.
    pub fn with_id(id: HashCoordinate, address: impl Into<String>, port: u16) -> Self {
        NodeId {
            id,
            address: address.into(),
            port,
        }
    }

    /// Whether both ids are reachable at the same address and port.
    pub fn same_endpoint(&self, other: &NodeId) -> bool {
        self.address == other.address && self.port == other.port
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.address, self.port, self.id)
    }
}
