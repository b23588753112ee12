//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod crawl;
mod reconcile;
mod status;
mod urls;
mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "pbp")]
#[command(about = "Crawl a season's play-by-play pages and export the actions as JSON")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory export files are written to
    #[arg(long, global = true, env = "PBP_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Data directory holding the manifest
    #[arg(long, global = true, env = "PBP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl and export games, resuming after the last exported game by default
    Crawl {
        /// First game to crawl; re-crawls every game from here even if already exported
        #[arg(long)]
        start: Option<u32>,
        /// Last game to crawl (default: last game of the season)
        #[arg(long)]
        end: Option<u32>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show season progress and pending games
    Status,

    /// Print the page URL and export filename of games
    Urls {
        /// Game numbers (1-based)
        games: Vec<u32>,
        /// Print every game of the season
        #[arg(short, long)]
        all: bool,
    },

    /// Rebuild the manifest from the files in the export directory
    Reconcile {
        /// Show what would change without writing the manifest
        #[arg(long)]
        dry_run: bool,
    },

    /// Check exported files against the hashes in the manifest
    Verify {
        /// Drop missing or modified games from the manifest so they are crawled again
        #[arg(long)]
        prune: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
        export_dir: cli.export_dir,
    };
    let (settings, _config) = load_settings(options).await?;

    match cli.command {
        Commands::Crawl {
            start,
            end,
            no_progress,
        } => crawl::cmd_crawl(&settings, start, end, !no_progress).await,
        Commands::Status => status::cmd_status(&settings).await,
        Commands::Urls { games, all } => urls::cmd_urls(&settings, &games, all).await,
        Commands::Reconcile { dry_run } => reconcile::cmd_reconcile(&settings, dry_run).await,
        Commands::Verify { prune } => verify::cmd_verify(&settings, prune).await,
    }
}
