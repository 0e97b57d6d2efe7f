//! Conversions between ring types and their protobuf form.

use crate::rpc::{FileMeta, NodeInfo};
use crate::types::FileRecord;
use hash_ring::{HashCoordinate, KeyParseError, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyParseError),

    #[error("port {0} is out of range")]
    InvalidPort(u32),

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

pub fn node_to_proto(node: &NodeId) -> NodeInfo {
    NodeInfo {
        id: node.id.to_hex(),
        ip: node.address.clone(),
        port: u32::from(node.port),
    }
}

pub fn proto_to_node(info: NodeInfo) -> Result<NodeId, WireError> {
    let id = HashCoordinate::from_hex(&info.id)?;
    let port = u16::try_from(info.port).map_err(|_| WireError::InvalidPort(info.port))?;
    Ok(NodeId::with_id(id, info.ip, port))
}

pub fn file_meta(record: &FileRecord) -> FileMeta {
    FileMeta {
        filename: record.filename.clone(),
        version: record.version,
    }
}

pub fn proto_to_file_record(meta: Option<FileMeta>) -> Result<FileRecord, WireError> {
    let meta = meta.ok_or(WireError::MissingField("meta"))?;
    Ok(FileRecord {
        filename: meta.filename,
        version: meta.version,
    })
}

/// URI a tonic channel can connect to for `host:port`.
pub fn endpoint_uri(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        // bare IPv6 literal
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}
