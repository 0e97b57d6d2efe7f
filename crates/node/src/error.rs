//! Error model of a ring node and its mapping onto gRPC statuses.

use crate::store::StoreError;
use common::{endpoint_uri, WireError};
use hash_ring::{HashCoordinate, NodeId, RangeError};
use thiserror::Error;
use tonic::metadata::MetadataValue;
use tonic::Status;

/// Metadata key carrying the owner's endpoint on `PERMISSION_DENIED`.
pub const OWNER_METADATA_KEY: &str = "chord-owner-addr";

#[derive(Error, Debug)]
pub enum RingError {
    #[error("ring membership is empty; this node cannot route")]
    EmptyRing,

    #[error("this node does not own the key for `{filename}` (owner is {owner})")]
    NotOwner { filename: String, owner: NodeId },

    #[error("file `{0}` is not currently available at this node")]
    NotFound(String),

    #[error("ring misconfigured: {0}")]
    Range(#[from] RangeError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("lookup of {key} gave up after {limit} hops")]
    HopLimitExceeded { key: HashCoordinate, limit: u32 },

    #[error("routing via {peer} failed: {message}")]
    Routing { peer: String, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<WireError> for RingError {
    fn from(err: WireError) -> Self {
        RingError::InvalidArgument(err.to_string())
    }
}

impl From<RingError> for Status {
    fn from(err: RingError) -> Self {
        match &err {
            RingError::EmptyRing => Status::failed_precondition(err.to_string()),
            RingError::NotOwner { owner, .. } => {
                let mut status = Status::permission_denied(err.to_string());
                let addr = endpoint_uri(&owner.address, owner.port);
                if let Ok(val) = MetadataValue::try_from(addr.as_str()) {
                    status.metadata_mut().insert(OWNER_METADATA_KEY, val);
                }
                status
            }
            RingError::NotFound(_) => Status::not_found(err.to_string()),
            RingError::InvalidArgument(_) => Status::invalid_argument(err.to_string()),
            RingError::HopLimitExceeded { .. } => Status::aborted(err.to_string()),
            RingError::Routing { .. } => Status::unavailable(err.to_string()),
            RingError::Range(_) | RingError::Storage(_) => Status::internal(err.to_string()),
        }
    }
}
