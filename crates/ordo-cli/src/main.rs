//! Ordo CLI - Command-line interface for inspecting ordo event stores

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ordo::prelude::*;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "ordo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the store directory
    #[arg(short, long, default_value = "./data")]
    db_path: PathBuf,

    /// JSON store configuration (overrides --db-path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Representation of global log entries the store was created with
    #[arg(long, value_enum)]
    global_entry_mode: Option<ModeArg>,

    /// Store was created with the zstd-compressed JSON codec
    #[arg(long)]
    compressed: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Copy,
    Pointer,
}

#[derive(Subcommand)]
enum Commands {
    /// Store information and status
    Status,

    /// List aggregate streams with their last version
    Streams,

    /// Print the events of one aggregate as JSON lines
    Stream {
        aggregate_type: String,
        aggregate_root_id: String,

        /// Only events after this version
        #[arg(short, long, default_value_t = 0)]
        after: Version,
    },

    /// Print the global order log as JSON lines
    Replay {
        /// First global sequence to print
        #[arg(short, long, default_value_t = 1)]
        start: Sequence,

        /// Maximum number of entries (all when omitted)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Print the saved snapshot of an aggregate
    Snapshot {
        aggregate_type: String,
        aggregate_root_id: String,
    },
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => StoreConfig::new(&self.db_path),
        };
        if let Some(mode) = self.global_entry_mode {
            config = config.with_global_entry_mode(match mode {
                ModeArg::Copy => GlobalEntryMode::Copy,
                ModeArg::Pointer => GlobalEntryMode::Pointer,
            });
        }
        Ok(config)
    }

    fn open(&self) -> Result<OrdoDb> {
        let config = self.store_config()?;
        let path = config.path.clone();
        let db = if self.compressed {
            OrdoDb::open_with_codec(config, Arc::new(CompressedCodec::new(JsonCodec)))
        } else {
            OrdoDb::open_with_config(config)
        };
        db.with_context(|| format!("Failed to open store at {}", path.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let db = cli.open()?;

    match &cli.command {
        Commands::Status => commands::status::execute(&db)?,
        Commands::Streams => commands::streams::execute(&db)?,
        Commands::Stream {
            aggregate_type,
            aggregate_root_id,
            after,
        } => commands::stream::execute(&db, aggregate_type, aggregate_root_id, *after)?,
        Commands::Replay { start, count } => commands::replay::execute(&db, *start, *count)?,
        Commands::Snapshot {
            aggregate_type,
            aggregate_root_id,
        } => commands::snapshot::execute(&db, aggregate_type, aggregate_root_id)?,
    }

    db.close().context("Failed to close store")?;
    Ok(())
}
