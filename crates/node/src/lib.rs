pub mod core;
pub mod error;
pub mod node;
pub mod service;
pub mod store;

pub use crate::core::{GrpcPeerClient, Ownership, PeerClient, Router, DEFAULT_MAX_HOPS};
pub use error::RingError;
pub use node::ChordNode;
pub use service::NodeService;
pub use store::{DiskStore, FileStore, MemoryStore, StoreError};

use common::rpc::chord_service_server::ChordServiceServer;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// Serves `node` on `addr` until the server stops.
pub async fn serve(node: Arc<ChordNode>, addr: SocketAddr) -> anyhow::Result<()> {
    info!("chord node {} listening on {}", node.local(), addr);
    Server::builder()
        .add_service(ChordServiceServer::new(NodeService::new(node)))
        .serve(addr)
        .await
        .map_err(Into::into)
}

/// Serves `node` on an already bound listener.
pub async fn serve_listener(node: Arc<ChordNode>, listener: TcpListener) -> anyhow::Result<()> {
    info!(
        "chord node {} listening on {}",
        node.local(),
        listener.local_addr()?
    );
    Server::builder()
        .add_service(ChordServiceServer::new(NodeService::new(node)))
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await
        .map_err(Into::into)
}
