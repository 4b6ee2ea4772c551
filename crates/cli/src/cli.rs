//! Command line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nopaystation_core::Region;

#[derive(Debug, Parser)]
#[command(
    name = "nps",
    version,
    about = "Keep a local title catalog in sync with remote TSV catalog sources"
)]
pub struct Cli {
    /// Configuration file. A missing file means built-in defaults.
    #[arg(
        long,
        global = true,
        env = "NPS_CONFIG",
        default_value = "config.toml",
        value_name = "PATH"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every source and ingest its catalog.
    Sync(SyncArgs),

    /// Ingest a local catalog file.
    Ingest {
        /// Source type to report the rows under.
        source_type: String,
        /// Tab-separated catalog file.
        file: PathBuf,
    },

    /// Manage the source registry.
    #[command(subcommand)]
    Sources(SourcesCommand),

    /// Inspect stored titles.
    #[command(subcommand)]
    Titles(TitlesCommand),
}

#[derive(Debug, clap::Args)]
pub struct SyncArgs {
    /// Only sync these source types (repeatable).
    #[arg(long = "source", value_name = "TYPE")]
    pub sources: Vec<String>,

    /// Ingest existing cache files without fetching.
    #[arg(long)]
    pub skip_fetch: bool,

    /// Write Prometheus metrics to this file when done.
    #[arg(long, value_name = "PATH")]
    pub metrics_out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum SourcesCommand {
    /// List registered sources.
    List,
    /// Add a source, or replace the URL of an existing one.
    Add { source_type: String, url: String },
    /// Remove a source.
    Remove { source_type: String },
}

#[derive(Debug, Subcommand)]
pub enum TitlesCommand {
    /// List stored titles.
    List {
        /// Only titles from this region (EU, US, JP, ASIA, None).
        #[arg(long)]
        region: Option<Region>,
    },
    /// Print the number of stored titles.
    Count,
}
