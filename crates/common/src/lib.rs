pub mod convert;
pub mod rpc;
pub mod types;

// Re-export commonly used types
pub use convert::{
    endpoint_uri, file_meta, node_to_proto, proto_to_file_record, proto_to_node, WireError,
};
pub use types::FileRecord;

/// Forwards a lookup may take before it is abandoned. On a consistent ring a
/// predecessor lookup forwards at most once.
pub const DEFAULT_MAX_HOPS: u32 = 64;
