//! Ring core: peer transport, routing and ownership-checked storage.

pub mod peer;
pub mod routing;
pub mod storage;

pub use peer::{GrpcPeerClient, PeerClient};
pub use routing::{Ownership, Router, DEFAULT_MAX_HOPS};
pub use storage::FileCatalog;
