//! Ring node entry point.
//!
//! # Usage
//! ```bash
//! # listen on 127.0.0.1:9090, membership pushed later by `chord-client bootstrap`
//! cargo run --bin chord-node -- 9090
//!
//! # install membership from a ring file at startup
//! cargo run --bin chord-node -- 9090 --ring config/ring.json
//!
//! # advertise a LAN address but listen on every interface
//! cargo run --bin chord-node -- 9090 --host 10.0.0.5 --bind 0.0.0.0
//! ```

use anyhow::Context;
use chord_storage_ring::{initialize, load_config};
use hash_ring::NodeId;
use log::{info, warn};
use node::{ChordNode, DiskStore, FileStore, GrpcPeerClient, MemoryStore, DEFAULT_MAX_HOPS};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(clap::Parser, Debug)]
#[command(name = "chord-node", about = "Chord ring file storage node")]
struct Cli {
    /// Port to listen on; part of the node's ring identity
    port: u16,
    /// Address other nodes and clients reach this node at
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Interface to listen on (defaults to --host)
    #[arg(long)]
    bind: Option<IpAddr>,
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Keep file contents in memory instead of under --data-dir
    #[arg(long)]
    in_memory: bool,
    /// Ring file to take this node's membership from
    #[arg(long)]
    ring: Option<PathBuf>,
    /// Forwards a lookup may take (overrides the ring file)
    #[arg(long)]
    max_hops: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let layout = match &cli.ring {
        Some(path) => {
            let config = load_config(path)
                .with_context(|| format!("failed to load ring file {}", path.display()))?;
            Some(initialize(&config).context("invalid ring file")?)
        }
        None => None,
    };

    let max_hops = cli
        .max_hops
        .or_else(|| layout.as_ref().map(|l| l.max_hops()))
        .unwrap_or(DEFAULT_MAX_HOPS);

    let store: Arc<dyn FileStore> = if cli.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        let disk = DiskStore::open(&cli.data_dir)
            .await
            .with_context(|| format!("failed to open data dir {}", cli.data_dir.display()))?;
        Arc::new(disk)
    };

    let local = NodeId::new(cli.host.clone(), cli.port);
    let chord_node = Arc::new(ChordNode::new(
        local.clone(),
        Arc::new(GrpcPeerClient::new()),
        store,
        max_hops,
    ));

    info!(
        "node {}:{} at coordinate {} (max hops {})",
        local.address, local.port, local.id, max_hops
    );

    if let Some(layout) = &layout {
        if !layout.contains(&local) {
            warn!(
                "{}:{} is not listed in the ring file; using it as a client entry point",
                local.address, local.port
            );
        }
        chord_node.set_membership(layout.membership_for(&local));
    }

    let bind_ip = match cli.bind {
        Some(ip) => ip,
        None => cli
            .host
            .parse()
            .with_context(|| format!("--host {} is not an IP address; pass --bind", cli.host))?,
    };

    node::serve(chord_node, SocketAddr::new(bind_ip, cli.port)).await
}
