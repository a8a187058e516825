//! # vaultsync
//!
//! Command-line peer for vaultsync.
//!
//! ## Commands
//!
//! - `init`: Create the state directory and a default config
//! - `serve`: Listen for one sync session and show the pairing code
//! - `connect`: Sync against a listening peer by pairing code
//! - `status`: Show vault, baseline and pending-change counts
//!
//! ## Example
//!
//! ```bash
//! # Machine A
//! vaultsync --vault ~/notes serve
//! # Pairing code: 42
//!
//! # Machine B, same subnet
//! vaultsync --vault ~/notes connect 42
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{connect, init, serve, status};
use config::Paths;

/// Peer-to-peer vault sync over the local network.
#[derive(Parser, Debug)]
#[command(name = "vaultsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Vault directory to sync
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    /// Config file (default: <vault>/.vaultsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the state directory and a default config.toml
    Init,

    /// Listen for one sync session and print the pairing code
    Serve,

    /// Sync with a listening peer
    Connect {
        /// Pairing code shown by the peer (prompted if omitted)
        code: Option<String>,
    },

    /// Show sync status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = Paths::new(cli.vault, cli.config);
    debug!(
        vault = %paths.vault().display(),
        config = %paths.config_file().display(),
        "Resolved paths"
    );

    match cli.command {
        Commands::Init => init::run(&paths).await?,
        Commands::Serve => serve::run(&paths).await?,
        Commands::Connect { code } => connect::run(&paths, code.as_deref()).await?,
        Commands::Status => status::run(&paths).await?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
