// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::commands::{directory_command, flows_command, init_command, show_command, sync_command};
use cmd::common::{DEFAULT_CONFIG, load_catalog_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "assetcat")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file
    Init,
    /// Reconcile live listings into the catalog
    Sync {
        /// Asset types to synchronize (repeatable); defaults to the configuration
        #[arg(short = 't', long = "asset-type")]
        asset_types: Vec<String>,
    },
    /// Print one asset type's records as JSON lines
    Show {
        #[arg(short = 't', long = "asset-type")]
        asset_type: String,
        /// Only records no longer present in the provider
        #[arg(long)]
        stale_only: bool,
    },
    /// List the asset type directory
    Directory,
    /// Record flows to known AI endpoints from a JSON-lines flow log
    Flows {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        let _ = init_command(&cli.config)?;
        return Ok(());
    }

    let config = load_catalog_config(&cli.config)?;
    match &cli.command {
        Commands::Init => Ok(()),
        Commands::Sync { asset_types } => sync_command(&config, asset_types).await,
        Commands::Show {
            asset_type,
            stale_only,
        } => show_command(&config, asset_type, *stale_only).await,
        Commands::Directory => directory_command(&config).await,
        Commands::Flows { input } => flows_command(&config, input).await,
    }
}
