//! Ring configuration and bootstrap.
//!
//! A ring file lists every member's endpoint. [`initialize`] turns it into a
//! [`RingLayout`], from which each node's membership table is derived.

use common::DEFAULT_MAX_HOPS;
use hash_ring::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ring file lists no nodes")]
    NoNodes,

    #[error("node {0} is listed more than once")]
    DuplicateNode(String),

    #[error("nodes {0} and {1} hash to the same coordinate")]
    CoordinateClash(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ring file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Endpoint of one ring member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

// Contents of a ring file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    pub nodes: Vec<NodeAddr>,
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
}

fn default_max_hops() -> u32 {
    DEFAULT_MAX_HOPS
}

/// Every ring member with its coordinate, ascending by coordinate.
#[derive(Debug, Clone)]
pub struct RingLayout {
    nodes: Vec<NodeId>,
    max_hops: u32,
}

impl RingLayout {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// The peer list to hand `local` at bootstrap: everyone but itself.
    pub fn membership_for(&self, local: &NodeId) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| *n != local).cloned().collect()
    }
}

/// Validates a ring file and places its nodes on the ring.
///
/// # Arguments
/// * `config` - ring file contents
///
/// # Returns
/// The layout, or an error for an empty ring, a repeated endpoint, or two
/// endpoints with the same coordinate.
pub fn initialize(config: &RingConfig) -> Result<RingLayout, ConfigError> {
    if config.nodes.is_empty() {
        return Err(ConfigError::NoNodes);
    }

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(config.nodes.len());
    for addr in &config.nodes {
        let endpoint = format!("{}:{}", addr.host, addr.port);
        if !seen.insert(endpoint.clone()) {
            return Err(ConfigError::DuplicateNode(endpoint));
        }
        nodes.push(NodeId::new(addr.host.clone(), addr.port));
    }

    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for pair in nodes.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(ConfigError::CoordinateClash(
                format!("{}:{}", pair[0].address, pair[0].port),
                format!("{}:{}", pair[1].address, pair[1].port),
            ));
        }
    }

    Ok(RingLayout {
        nodes,
        max_hops: config.max_hops,
    })
}

/// Load a ring file
pub fn load_config(path: impl AsRef<Path>) -> Result<RingConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: RingConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save a ring file
pub fn save_config(config: &RingConfig, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ports: &[u16]) -> RingConfig {
        RingConfig {
            nodes: ports
                .iter()
                .map(|&port| NodeAddr {
                    host: "127.0.0.1".to_string(),
                    port,
                })
                .collect(),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    #[test]
    fn test_initialize() {
        let layout = initialize(&config(&[9090, 9091, 9092])).unwrap();
        assert_eq!(layout.nodes().len(), 3);
        assert!(layout.nodes().windows(2).all(|w| w[0].id < w[1].id));

        let local = NodeId::new("127.0.0.1", 9091);
        assert!(layout.contains(&local));
        let peers = layout.membership_for(&local);
        assert_eq!(peers.len(), 2);
        assert!(!peers.contains(&local));
    }

    #[test]
    fn test_initialize_rejects_bad_rings() {
        assert!(matches!(initialize(&config(&[])), Err(ConfigError::NoNodes)));
        assert!(matches!(
            initialize(&config(&[9090, 9090])),
            Err(ConfigError::DuplicateNode(endpoint)) if endpoint == "127.0.0.1:9090"
        ));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.json");

        let config = config(&[9090, 9091]);
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_max_hops_defaults() {
        let config: RingConfig =
            serde_json::from_str(r#"{"nodes": [{"host": "10.0.0.1", "port": 9090}]}"#).unwrap();
        assert_eq!(config.max_hops, DEFAULT_MAX_HOPS);
    }

    #[test]
    fn test_shipped_ring_file_is_valid() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config/ring.json")).unwrap();
        assert_eq!(initialize(&config).unwrap().nodes().len(), 3);
    }
}
