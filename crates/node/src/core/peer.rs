//! Outbound calls a node makes to other ring members while routing.

use crate::error::RingError;
use common::rpc::{
    chord_service_client::ChordServiceClient, FindPredecessorRequest, GetFirstSuccessorRequest,
};
use common::{endpoint_uri, proto_to_node};
use hash_ring::{HashCoordinate, NodeId};

/// The two remote operations the routing engine needs.
///
/// Any failure, whether the peer is unreachable or the peer itself failed
/// the lookup, surfaces as an error for the whole lookup; implementations
/// must not retry.
#[tonic::async_trait]
pub trait PeerClient: Send + Sync {
    /// Asks `peer` for the predecessor of `key`. `hops` is the hop count the
    /// peer should see, already including this forward.
    async fn find_predecessor(
        &self,
        peer: &NodeId,
        key: &HashCoordinate,
        hops: u32,
    ) -> Result<NodeId, RingError>;

    /// Asks `peer` for its immediate successor.
    async fn get_first_successor(&self, peer: &NodeId) -> Result<NodeId, RingError>;
}

/// gRPC transport, one connection per call.
#[derive(Debug, Default, Clone)]
pub struct GrpcPeerClient;

impl GrpcPeerClient {
    pub fn new() -> Self {
        GrpcPeerClient
    }

    async fn connect(
        &self,
        peer: &NodeId,
    ) -> Result<ChordServiceClient<tonic::transport::Channel>, RingError> {
        ChordServiceClient::connect(endpoint_uri(&peer.address, peer.port))
            .await
            .map_err(|e| routing_failure(peer, format!("failed to connect: {}", e)))
    }
}

#[tonic::async_trait]
impl PeerClient for GrpcPeerClient {
    async fn find_predecessor(
        &self,
        peer: &NodeId,
        key: &HashCoordinate,
        hops: u32,
    ) -> Result<NodeId, RingError> {
        let mut client = self.connect(peer).await?;
        let request = FindPredecessorRequest {
            key: key.to_hex(),
            hops,
        };

        let response = client
            .find_predecessor(request)
            .await
            .map_err(|status| routing_failure(peer, status.message().to_string()))?;

        proto_to_node(response.into_inner())
            .map_err(|e| routing_failure(peer, format!("malformed reply: {}", e)))
    }

    async fn get_first_successor(&self, peer: &NodeId) -> Result<NodeId, RingError> {
        let mut client = self.connect(peer).await?;

        let response = client
            .get_first_successor(GetFirstSuccessorRequest {})
            .await
            .map_err(|status| routing_failure(peer, status.message().to_string()))?;

        proto_to_node(response.into_inner())
            .map_err(|e| routing_failure(peer, format!("malformed reply: {}", e)))
    }
}

fn routing_failure(peer: &NodeId, message: String) -> RingError {
    RingError::Routing {
        peer: format!("{}:{}", peer.address, peer.port),
        message,
    }
}
