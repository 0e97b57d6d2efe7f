use anyhow::Context;
use chord_storage_ring::RingLayout;
use common::rpc::{
    chord_service_client::ChordServiceClient, FindPredecessorRequest, FindSuccessorRequest,
    GetFirstSuccessorRequest, ReadFileRequest, SetMembershipRequest, WriteFileRequest,
};
use common::{endpoint_uri, node_to_proto, proto_to_file_record, proto_to_node, FileRecord};
use hash_ring::{hash_key, HashCoordinate, NodeId};
use tonic::transport::Channel;

/// Client for a single ring node.
///
/// Requests go to exactly this node; a `NotOwner` refusal is returned as is
/// rather than re-routed.
pub struct Client {
    node_addr: String,
}

impl Client {
    pub fn new(host: &str, port: u16) -> Self {
        Client {
            node_addr: endpoint_uri(host, port),
        }
    }

    pub fn for_node(node: &NodeId) -> Self {
        Self::new(&node.address, node.port)
    }

    async fn connect(&self) -> anyhow::Result<ChordServiceClient<Channel>> {
        ChordServiceClient::connect(self.node_addr.clone())
            .await
            .with_context(|| format!("failed to connect to {}", self.node_addr))
    }

    /// Write file: create or overwrite `filename` on this node
    pub async fn write_file(&self, filename: &str, content: Vec<u8>) -> anyhow::Result<FileRecord> {
        let mut client = self.connect().await?;

        let request = WriteFileRequest {
            filename: filename.to_string(),
            content,
        };

        let resp = client.write_file(request).await?.into_inner();
        Ok(proto_to_file_record(resp.meta)?)
    }

    /// Read file: fetch content and metadata of `filename`
    pub async fn read_file(&self, filename: &str) -> anyhow::Result<(FileRecord, Vec<u8>)> {
        let mut client = self.connect().await?;

        let request = ReadFileRequest {
            filename: filename.to_string(),
        };

        let resp = client.read_file(request).await?.into_inner();
        Ok((proto_to_file_record(resp.meta)?, resp.content))
    }

    /// Owner of `filename`, as routed by this node
    pub async fn find_successor(&self, filename: &str) -> anyhow::Result<NodeId> {
        self.find_successor_of(&hash_key(filename)).await
    }

    pub async fn find_successor_of(&self, key: &HashCoordinate) -> anyhow::Result<NodeId> {
        let mut client = self.connect().await?;

        let request = FindSuccessorRequest {
            key: key.to_hex(),
            hops: 0,
        };

        let resp = client.find_successor(request).await?.into_inner();
        Ok(proto_to_node(resp)?)
    }

    /// Predecessor of `filename`'s key, as routed by this node
    pub async fn find_predecessor(&self, filename: &str) -> anyhow::Result<NodeId> {
        self.find_predecessor_of(&hash_key(filename)).await
    }

    pub async fn find_predecessor_of(&self, key: &HashCoordinate) -> anyhow::Result<NodeId> {
        let mut client = self.connect().await?;

        let request = FindPredecessorRequest {
            key: key.to_hex(),
            hops: 0,
        };

        let resp = client.find_predecessor(request).await?.into_inner();
        Ok(proto_to_node(resp)?)
    }

    /// The node immediately clockwise of this one
    pub async fn get_first_successor(&self) -> anyhow::Result<NodeId> {
        let mut client = self.connect().await?;

        let resp = client
            .get_first_successor(GetFirstSuccessorRequest {})
            .await?
            .into_inner();
        Ok(proto_to_node(resp)?)
    }

    /// Install this node's membership; returns the number of peers it kept
    pub async fn set_membership(&self, nodes: &[NodeId]) -> anyhow::Result<u32> {
        let mut client = self.connect().await?;

        let request = SetMembershipRequest {
            nodes: nodes.iter().map(node_to_proto).collect(),
        };

        let resp = client.set_membership(request).await?.into_inner();
        Ok(resp.peer_count)
    }
}

/// Pushes every node of `layout` its membership table.
///
/// Stops at the first node that can't be reached.
pub async fn bootstrap(layout: &RingLayout) -> anyhow::Result<()> {
    for node in layout.nodes() {
        let peers = layout.membership_for(node);
        let kept = Client::for_node(node)
            .set_membership(&peers)
            .await
            .with_context(|| format!("bootstrap of {}:{} failed", node.address, node.port))?;
        println!("{}:{} knows {} peer(s)", node.address, node.port, kept);
    }
    Ok(())
}
