use anyhow::Context;
use chord_storage_ring::{initialize, load_config};
use clap::{Parser, Subcommand};
use client::{bootstrap, Client};
use hash_ring::NodeId;
use std::path::PathBuf;
use tonic::Status;

#[derive(Parser, Debug)]
#[command(name = "chord-client", about = "Command-line client for a chord storage ring")]
struct Cli {
    /// Address of the node to talk to
    #[arg(long, default_value = "127.0.0.1", global = true)]
    host: String,
    #[arg(long, default_value_t = 9090, global = true)]
    port: u16,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or overwrite a file on the node
    Write {
        filename: String,
        /// Content to store
        #[arg(long, conflicts_with = "from_file")]
        content: Option<String>,
        /// Store the bytes of a local file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// Read a file from the node
    Read { filename: String },
    /// Ask the node who owns a filename
    FindSuccessor { filename: String },
    /// Ask the node for the predecessor of a filename's key
    FindPredecessor { filename: String },
    /// Ask the node for its immediate successor
    FirstSuccessor,
    /// Push every node in a ring file its membership
    Bootstrap {
        #[arg(long)]
        ring: PathBuf,
    },
}

fn print_node(label: &str, node: &NodeId) {
    println!("{} Node id: {}", label, node.id);
    println!("{} Node ip: {}", label, node.address);
    println!("{} Node port: {}", label, node.port);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = Client::new(&cli.host, cli.port);

    match cli.command {
        Command::Write {
            filename,
            content,
            from_file,
        } => {
            let bytes = match (content, from_file) {
                (Some(text), None) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                _ => anyhow::bail!("write needs --content or --from-file"),
            };
            let record = client.write_file(&filename, bytes).await?;
            println!("File Name: {}", record.filename);
            println!("File Version: {}", record.version);
        }
        Command::Read { filename } => {
            let (record, content) = client.read_file(&filename).await?;
            println!("File Name: {}", record.filename);
            println!("File Version: {}", record.version);
            println!("File Content: {}", String::from_utf8_lossy(&content));
        }
        Command::FindSuccessor { filename } => {
            print_node("Succ", &client.find_successor(&filename).await?);
        }
        Command::FindPredecessor { filename } => {
            print_node("Pred", &client.find_predecessor(&filename).await?);
        }
        Command::FirstSuccessor => {
            print_node("First", &client.get_first_successor().await?);
        }
        Command::Bootstrap { ring } => {
            let config = load_config(&ring)
                .with_context(|| format!("failed to load ring file {}", ring.display()))?;
            let layout = initialize(&config).context("invalid ring file")?;
            bootstrap(&layout).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<Status>() {
            Some(status) => eprintln!("{:?}: {}", status.code(), status.message()),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
