//! `phonebank`: manage partitioned phone-number lists from the terminal.
//!
//! # Usage
//!
//! ```
//! phonebank init
//! phonebank import --to partition_1 --dataset leads --date 2024-05-01 numbers.txt
//! phonebank export partition_1 --take leads=500 --output out.txt
//! phonebank --config ~/.config/phonebank.toml duplicates --csv dups.csv
//! ```

mod commands;
mod config;
mod interact;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use phonebank_core::record::DataType;
use phonebank_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Partitioned phone-number list manager")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "phonebank.toml")]
  config: PathBuf,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create every partition in the store.
  Init,

  /// Import text files of numbers into a partition.
  Import(ImportArgs),

  /// Search one partition.
  Search {
    partition: String,
    /// Substring of the phone number.
    #[arg(long)]
    phone:     Option<String>,
    /// Substring of the dataset name.
    #[arg(long)]
    dataset:   Option<String>,
    /// Earliest receive date, inclusive.
    #[arg(long)]
    from:      Option<String>,
    /// Latest receive date, inclusive.
    #[arg(long)]
    to:        Option<String>,
  },

  /// List datasets of a partition with total and exportable counts.
  Datasets { partition: String },

  /// Copy datasets from one partition to another.
  Move {
    #[arg(long)]
    from:     String,
    #[arg(long)]
    to:       String,
    /// Remove each dataset from the source once copied.
    #[arg(long)]
    delete:   bool,
    #[arg(required = true)]
    datasets: Vec<String>,
  },

  /// Export numbers by per-dataset quota and mark them exported.
  Export {
    partition: String,
    /// `DATASET=COUNT`; repeat for several datasets.
    #[arg(long = "take", value_name = "DATASET=COUNT", required = true)]
    take:      Vec<String>,
    /// File of extra numbers to shuffle into the output.
    #[arg(long)]
    inject:    Option<PathBuf>,
    #[arg(short, long)]
    output:    PathBuf,
  },

  /// Report repeated numbers in the duplicate-holding partition.
  Duplicates {
    /// Also write the report as CSV.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
  },

  /// Delete numbers from the duplicate-holding partition.
  PurgeDuplicates {
    numbers: Vec<String>,
    /// Read numbers from a file, one per line.
    #[arg(long)]
    file:    Option<PathBuf>,
    #[arg(short, long)]
    yes:     bool,
  },

  /// Delete whole datasets from a partition.
  DeleteDatasets {
    partition: String,
    #[arg(required = true)]
    datasets:  Vec<String>,
    #[arg(short, long)]
    yes:       bool,
  },

  /// Merge two text files and shuffle their lines.
  Combine {
    first:  PathBuf,
    second: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
  },
}

#[derive(Args, Debug)]
struct ImportArgs {
  /// Destination partition, e.g. `partition_3` or `3`.
  #[arg(long)]
  to:        String,
  #[arg(long, required_unless_present = "preview")]
  dataset:   Option<String>,
  /// Receive date as YYYY-MM-DD or MM/DD/YY.
  #[arg(long, required_unless_present = "preview")]
  date:      Option<String>,
  #[arg(long, default_value = "")]
  source:    String,
  #[arg(long, default_value = "")]
  detail:    String,
  #[arg(long, default_value_t = DataType::Organization)]
  data_type: DataType,
  /// Classify only; write nothing.
  #[arg(long)]
  preview:   bool,
  #[arg(required = true)]
  files:     Vec<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // `combine` works on plain files and never opens the store.
  if let Command::Combine { first, second, output } = &cli.command {
    return commands::combine(first, second, output).await;
  }

  let cfg = AppConfig::load(&cli.config)?;
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  commands::run(&store, &cfg, cli.command, cli.json).await
}
