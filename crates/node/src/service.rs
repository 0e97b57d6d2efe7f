use crate::error::RingError;
use crate::node::ChordNode;
use common::rpc::{
    chord_service_server::ChordService, FindPredecessorRequest, FindSuccessorRequest,
    GetFirstSuccessorRequest, NodeInfo, ReadFileRequest, ReadFileResponse, SetMembershipRequest,
    SetMembershipResponse, WriteFileRequest, WriteFileResponse,
};
use common::{file_meta, node_to_proto, proto_to_node};
use hash_ring::{HashCoordinate, NodeId};
use log::debug;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// gRPC front of a [`ChordNode`].
pub struct NodeService {
    node: Arc<ChordNode>,
}

impl NodeService {
    pub fn new(node: Arc<ChordNode>) -> Self {
        NodeService { node }
    }
}

fn parse_key(raw: &str) -> Result<HashCoordinate, Status> {
    HashCoordinate::from_hex(raw)
        .map_err(|e| Status::invalid_argument(format!("invalid key: {}", e)))
}

fn check_filename(filename: &str) -> Result<(), Status> {
    if filename.is_empty() {
        return Err(Status::invalid_argument("filename must not be empty"));
    }
    Ok(())
}

#[tonic::async_trait]
impl ChordService for NodeService {
    async fn write_file(
        &self,
        request: Request<WriteFileRequest>,
    ) -> Result<Response<WriteFileResponse>, Status> {
        let req = request.into_inner();
        debug!(
            "received WriteFile: filename={}, {} bytes",
            req.filename,
            req.content.len()
        );
        check_filename(&req.filename)?;

        let record = self.node.write_file(&req.filename, &req.content).await?;

        Ok(Response::new(WriteFileResponse {
            meta: Some(file_meta(&record)),
        }))
    }

    async fn read_file(
        &self,
        request: Request<ReadFileRequest>,
    ) -> Result<Response<ReadFileResponse>, Status> {
        let req = request.into_inner();
        debug!("received ReadFile: filename={}", req.filename);
        check_filename(&req.filename)?;

        let (record, content) = self.node.read_file(&req.filename).await?;

        Ok(Response::new(ReadFileResponse {
            meta: Some(file_meta(&record)),
            content,
        }))
    }

    async fn find_predecessor(
        &self,
        request: Request<FindPredecessorRequest>,
    ) -> Result<Response<NodeInfo>, Status> {
        let req = request.into_inner();
        debug!("received FindPredecessor: key={}, hops={}", req.key, req.hops);
        let key = parse_key(&req.key)?;

        let pred = self.node.router().find_predecessor(&key, req.hops).await?;

        Ok(Response::new(node_to_proto(&pred)))
    }

    async fn find_successor(
        &self,
        request: Request<FindSuccessorRequest>,
    ) -> Result<Response<NodeInfo>, Status> {
        let req = request.into_inner();
        debug!("received FindSuccessor: key={}, hops={}", req.key, req.hops);
        let key = parse_key(&req.key)?;

        let succ = self.node.router().find_successor(&key, req.hops).await?;

        Ok(Response::new(node_to_proto(&succ)))
    }

    async fn get_first_successor(
        &self,
        _request: Request<GetFirstSuccessorRequest>,
    ) -> Result<Response<NodeInfo>, Status> {
        debug!("received GetFirstSuccessor");
        let succ = self.node.router().first_successor()?;
        Ok(Response::new(node_to_proto(&succ)))
    }

    async fn set_membership(
        &self,
        request: Request<SetMembershipRequest>,
    ) -> Result<Response<SetMembershipResponse>, Status> {
        let req = request.into_inner();
        debug!("received SetMembership with {} node(s)", req.nodes.len());

        let nodes = req
            .nodes
            .into_iter()
            .map(proto_to_node)
            .collect::<Result<Vec<NodeId>, _>>()
            .map_err(RingError::from)?;

        let kept = self.node.set_membership(nodes);

        Ok(Response::new(SetMembershipResponse {
            peer_count: kept as u32,
        }))
    }
}
