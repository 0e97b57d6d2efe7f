//! Three real nodes on loopback, driven through the client crate.

use chord_storage_ring::{initialize, NodeAddr, RingConfig};
use client::Client;
use hash_ring::{hash_key, HashCoordinate, NodeId};
use node::error::OWNER_METADATA_KEY;
use node::{ChordNode, GrpcPeerClient, MemoryStore, DEFAULT_MAX_HOPS};
use std::sync::Arc;
use tokio::net::TcpListener;
use tonic::{Code, Status};

async fn start_node(listener: TcpListener) -> NodeId {
    let port = listener.local_addr().unwrap().port();
    let id = NodeId::new("127.0.0.1", port);
    let chord_node = Arc::new(ChordNode::new(
        id.clone(),
        Arc::new(GrpcPeerClient::new()),
        Arc::new(MemoryStore::new()),
        DEFAULT_MAX_HOPS,
    ));
    tokio::spawn(node::serve_listener(chord_node, listener));
    id
}

/// Starts `n` nodes and bootstraps them the way `chord-client bootstrap` does.
async fn start_ring(n: usize) -> Vec<NodeId> {
    let mut members = Vec::new();
    for _ in 0..n {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        members.push(start_node(listener).await);
    }

    let config = RingConfig {
        nodes: members
            .iter()
            .map(|m| NodeAddr {
                host: m.address.clone(),
                port: m.port,
            })
            .collect(),
        max_hops: DEFAULT_MAX_HOPS,
    };
    client::bootstrap(&initialize(&config).unwrap()).await.unwrap();
    members
}

fn expected_owner(members: &[NodeId], key: &HashCoordinate) -> NodeId {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|n| n.id);
    sorted
        .iter()
        .find(|n| n.id >= *key)
        .unwrap_or(&sorted[0])
        .clone()
}

fn status_of(err: &anyhow::Error) -> &Status {
    err.downcast_ref::<Status>()
        .unwrap_or_else(|| panic!("not a gRPC status: {:#}", err))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_and_read_across_the_ring() {
    let members = start_ring(3).await;
    let owner = expected_owner(&members, &hash_key("report.txt"));
    let others: Vec<&NodeId> = members.iter().filter(|m| **m != owner).collect();

    // every entry point routes to the same owner
    for member in &members {
        let found = Client::for_node(member)
            .find_successor("report.txt")
            .await
            .unwrap();
        assert_eq!(found, owner);
    }

    let err = Client::for_node(others[0])
        .write_file("report.txt", b"draft".to_vec())
        .await
        .unwrap_err();
    let status = status_of(&err);
    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(
        status
            .metadata()
            .get(OWNER_METADATA_KEY)
            .and_then(|v| v.to_str().ok()),
        Some(format!("http://127.0.0.1:{}", owner.port).as_str())
    );

    let at_owner = Client::for_node(&owner);
    let record = at_owner
        .write_file("report.txt", b"draft".to_vec())
        .await
        .unwrap();
    assert_eq!(record.version, 0);
    let record = at_owner
        .write_file("report.txt", b"final".to_vec())
        .await
        .unwrap();
    assert_eq!(record.version, 1);

    let (record, content) = at_owner.read_file("report.txt").await.unwrap();
    assert_eq!(record.filename, "report.txt");
    assert_eq!(record.version, 1);
    assert_eq!(content, b"final");

    for other in others {
        let err = Client::for_node(other)
            .read_file("report.txt")
            .await
            .unwrap_err();
        assert_eq!(status_of(&err).code(), Code::PermissionDenied);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_missing_file_at_owner() {
    let members = start_ring(3).await;
    let owner = expected_owner(&members, &hash_key("never-written.txt"));

    let err = Client::for_node(&owner)
        .read_file("never-written.txt")
        .await
        .unwrap_err();
    assert_eq!(status_of(&err).code(), Code::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_successor_links_follow_the_ring() {
    let members = start_ring(3).await;
    let mut sorted = members.clone();
    sorted.sort_by_key(|n| n.id);

    for (i, member) in sorted.iter().enumerate() {
        let next = &sorted[(i + 1) % sorted.len()];
        let client = Client::for_node(member);
        assert_eq!(&client.get_first_successor().await.unwrap(), next);
        // a key on a node's own coordinate is owned by that node
        assert_eq!(&client.find_successor_of(&member.id).await.unwrap(), member);
        assert_eq!(&client.find_predecessor_of(&member.id).await.unwrap(), member);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unbootstrapped_node() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let id = start_node(listener).await;
    let client = Client::for_node(&id);

    let err = client.get_first_successor().await.unwrap_err();
    assert_eq!(status_of(&err).code(), Code::FailedPrecondition);

    let err = client.write_file("a.txt", b"x".to_vec()).await.unwrap_err();
    assert_eq!(status_of(&err).code(), Code::FailedPrecondition);

    // predecessor lookups fall back to the node itself
    assert_eq!(client.find_predecessor("a.txt").await.unwrap(), id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejects_empty_filename() {
    let members = start_ring(2).await;
    let err = Client::for_node(&members[0])
        .write_file("", b"x".to_vec())
        .await
        .unwrap_err();
    assert_eq!(status_of(&err).code(), Code::InvalidArgument);
}
