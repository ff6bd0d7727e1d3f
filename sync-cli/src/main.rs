//! # roomtimer
//!
//! Command-line client for following a roomtimer room in real time.
//!
//! ## Commands
//!
//! - `init`: Store the API URL, room id and API key
//! - `status`: Show the stored configuration
//! - `watch`: Connect and print every state change
//!
//! ## Example
//!
//! ```bash
//! # Configure the room
//! roomtimer init --api-url https://api.example.io/v1/ --room-id r1 --api-key $KEY
//!
//! # Follow it
//! roomtimer watch
//!
//! # Try it without a network connection
//! roomtimer watch --mock
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{init, status, watch};
use config::{ClientConfig, Overrides};

/// Command-line client for roomtimer rooms.
#[derive(Parser, Debug)]
#[command(name = "roomtimer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the room configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store room connection settings
    Init {
        /// Base URL of the timer service API
        #[arg(long)]
        api_url: String,

        /// Room to join
        #[arg(long)]
        room_id: String,

        /// Room API key
        #[arg(long)]
        api_key: String,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show the stored configuration
    Status,

    /// Follow the room until Ctrl+C
    Watch {
        /// Use a scripted mock transport instead of the network (for testing/demo)
        #[arg(long)]
        mock: bool,

        /// Override the stored API URL
        #[arg(long)]
        api_url: Option<String>,

        /// Override the stored room id
        #[arg(long)]
        room_id: Option<String>,

        /// Override the stored API key
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    match cli.command {
        Commands::Init {
            api_url,
            room_id,
            api_key,
            force,
        } => {
            tokio::fs::create_dir_all(&data_dir)
                .await
                .context("Failed to create data directory")?;
            config::set_dir_permissions_0700(&data_dir).await?;

            let config = ClientConfig {
                api_url,
                room_id,
                api_key,
            };
            init::run(&data_dir, config, force).await?;
        }
        Commands::Status => {
            status::run(&data_dir).await?;
        }
        Commands::Watch {
            mock,
            api_url,
            room_id,
            api_key,
        } => {
            let overrides = Overrides {
                api_url,
                room_id,
                api_key,
            };
            let config = ClientConfig::resolve(&data_dir, overrides).await?;
            watch::run(config, mock).await?;
        }
    }

    Ok(())
}

/// Send tracing output to stderr; `RUST_LOG` applies unless `--verbose`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Get the default data directory for roomtimer.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "roomtimer", "roomtimer")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
