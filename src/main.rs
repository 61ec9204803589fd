//! # corpus-stitch CLI (`stitch`)
//!
//! The `stitch` binary is the primary interface for corpus-stitch. It
//! provides commands for database initialization, corpus ingestion,
//! document reconstruction, and database statistics.
//!
//! ## Usage
//!
//! ```bash
//! stitch --config ./config/stitch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stitch init` | Create the SQLite database and run schema migrations |
//! | `stitch ingest` | Chunk every corpus document and store the chunks |
//! | `stitch reconstruct <source_id>` | Reassemble one document from its chunks |
//! | `stitch stats` | Show document/chunk counts and per-document detail |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! stitch init --config ./config/stitch.toml
//!
//! # Chunk the corpus directory
//! stitch ingest --config ./config/stitch.toml
//!
//! # Preview without writing
//! stitch ingest --dry-run
//!
//! # Reassemble a document for an LLM prompt, as JSON
//! stitch reconstruct patterns/triage-table.md --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use corpus_stitch::{config, ingest, migrate, reconstruct, stats};

/// corpus-stitch CLI — size-bounded markdown chunking and
/// order-preserving document reconstruction for RAG corpora.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file.
#[derive(Parser)]
#[command(
    name = "stitch",
    about = "corpus-stitch — size-bounded markdown chunking and document reconstruction for RAG corpora",
    version,
    long_about = "corpus-stitch splits long markdown documents (very large tables in particular) \
    into size-bounded, independently embeddable chunks, and reassembles any document back from \
    its stored chunks on demand: header once, all rows in original order, no duplication."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stitch.toml`. Database, chunking, and
    /// corpus settings are read from this file.
    #[arg(long, global = true, default_value = "./config/stitch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the chunks table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Chunk every corpus document and store the chunks.
    ///
    /// Walks the configured corpus directory, splits each matching file
    /// (table-aware), and replaces that document's chunk set in the
    /// database. Re-running supersedes previously stored chunks.
    Ingest {
        /// Show file and chunk counts without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Reassemble one document from its stored chunks.
    ///
    /// Fetches all chunks for the source, orders them by index, strips
    /// repeated table headers and overlap rows, and prints the logical
    /// document.
    Reconstruct {
        /// Source document identifier (corpus-relative path).
        source_id: String,

        /// Emit the full result as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Show database statistics.
    ///
    /// Document and chunk counts, table share, and a per-document
    /// breakdown with last ingest times.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dry_run, limit } => {
            ingest::run_ingest(&cfg, dry_run, limit).await?;
        }
        Commands::Reconstruct { source_id, json } => {
            reconstruct::run_reconstruct(&cfg, &source_id, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
