use crate::{HashCoordinate, NodeId};

/// The peers a node knows about, in clockwise order starting just after the
/// local node.
///
/// The table never contains the local node and is read-only once built; a
/// new bootstrap builds a new table rather than editing this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    peers: Vec<NodeId>,
}

impl Membership {
    pub fn empty() -> Self {
        Membership { peers: Vec::new() }
    }

    /// Builds the table of `local` from peers given in any order.
    ///
    /// Entries sitting on the local coordinate are dropped, as are repeated
    /// coordinates. The rest is sorted ascending and rotated so the local
    /// node's immediate successor comes first.
    pub fn new(local: &NodeId, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut peers: Vec<NodeId> = nodes.into_iter().filter(|n| n.id != local.id).collect();

        peers.sort_by(|a, b| {
            clockwise_rank(&local.id, &a.id).cmp(&clockwise_rank(&local.id, &b.id))
        });
        peers.dedup_by(|a, b| a.id == b.id);

        Membership { peers }
    }

    /// The node immediately clockwise of the local node.
    pub fn first_successor(&self) -> Option<&NodeId> {
        self.peers.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<'a> IntoIterator for &'a Membership {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.iter()
    }
}

/// Sort key placing coordinates after `origin` before the ones that wrap.
fn clockwise_rank(origin: &HashCoordinate, id: &HashCoordinate) -> (bool, HashCoordinate) {
    (id <= origin, *id)
}
