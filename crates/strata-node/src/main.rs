// crates/strata-node/src/main.rs
//
// Binary entrypoint for the Strata node.
//
// Parses CLI arguments, loads configuration, initializes tracing, opens the
// staking store (RocksDB or in-memory), loads genesis and replays a file of
// blocks through the staking keeper.

mod bank;
mod config;
mod error;
mod genesis;
mod msg;
mod replay;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config::NodeConfig;
use error::NodeError;
use genesis::NodeGenesis;
use msg::Block;
use replay::Replayer;

use strata_core::traits::KvStore;
use strata_store::{MemStore, RocksStore};

/// Strata node: replays staking transactions against a local store.
#[derive(Parser, Debug)]
#[command(name = "strata-node", version = "0.1.0", about = "Strata staking node")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.strata/config.toml")]
    config: String,

    /// Keep state in memory regardless of the config file.
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load genesis and check it against the staking invariants.
    CheckGenesis {
        /// Genesis file (TOML, or JSON with a .json extension).
        #[arg(long)]
        genesis: String,
    },

    /// Load genesis, apply a JSON array of blocks, optionally export the result.
    Replay {
        #[arg(long)]
        genesis: String,

        #[arg(long)]
        blocks: String,

        /// Write the final state as JSON genesis to this path.
        #[arg(long)]
        export: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = config::expand_tilde(&args.config);
    let loaded = NodeConfig::load(&config_path);
    let mut node_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => NodeConfig::default(),
    };
    if args.in_memory {
        node_config.in_memory = true;
    }

    // Initialize tracing subscriber for structured logging. RUST_LOG wins
    // over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&node_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    match run(&args.command, &node_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands, node_config: &NodeConfig) -> Result<(), NodeError> {
    match command {
        Commands::CheckGenesis { genesis } => {
            let genesis = NodeGenesis::load(genesis)?;
            let replayer = Replayer::from_genesis(
                Box::new(MemStore::new()),
                &genesis,
                node_config.check_invariants,
                "memory",
            )?;
            let validators = replayer
                .keeper()
                .validators(replayer.store())
                .map_err(NodeError::Fatal)?;
            tracing::info!("Genesis is valid ({} validators)", validators.len());
            Ok(())
        }
        Commands::Replay {
            genesis,
            blocks,
            export,
        } => {
            let genesis = NodeGenesis::load(genesis)?;
            let blocks = Block::load_all(blocks)?;
            let (store, location) = open_store(node_config)?;
            let mut replayer =
                Replayer::from_genesis(store, &genesis, node_config.check_invariants, &location)?;

            let mut rejected = 0;
            for block in &blocks {
                rejected += replayer.apply_block(block)?.rejected;
            }
            tracing::info!(
                "Replayed {} blocks ({} rejected txs); liquid supply {}",
                blocks.len(),
                rejected,
                replayer.bank().total()
            );

            if let Some(path) = export {
                replayer.export()?.export(path)?;
                tracing::info!("Exported state to {}", path);
            }
            Ok(())
        }
    }
}

fn open_store(node_config: &NodeConfig) -> Result<(Box<dyn KvStore>, String), NodeError> {
    if node_config.in_memory {
        tracing::info!("Using in-memory staking store");
        return Ok((Box::new(MemStore::new()), "memory".to_string()));
    }

    let data_dir = config::expand_tilde(&node_config.data_dir);
    std::fs::create_dir_all(&data_dir).map_err(|source| NodeError::Io {
        path: data_dir.clone(),
        source,
    })?;
    let path = node_config.staking_db_path();
    let store = RocksStore::open(&path)?;
    tracing::info!("Opened staking store at {}", path);
    Ok((Box::new(store), path))
}
