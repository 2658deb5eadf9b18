//! CLI argument definitions for the Nestmap binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Nested map inspection and mutation replay
#[derive(Parser, Debug)]
#[command(name = "nestmap")]
#[command(about = "Nestmap: load nested JSON into a map, replay mutations, watch the events")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        default_value = "human",
        env = "NESTMAP_FORMAT"
    )]
    pub format: OutputFormat,

    /// Remove containers as soon as a deletion leaves them empty
    #[arg(long, global = true, env = "NESTMAP_AUTO_PURGE")]
    pub auto_purge: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the entries of a JSON document loaded as a map
    Entries(EntriesArgs),
    /// Apply mutations to a JSON document and print the events they fire
    Replay(ReplayArgs),
}

/// Arguments for the entries command
#[derive(clap::Args, Debug)]
pub struct EntriesArgs {
    /// JSON document whose root is an object
    pub file: PathBuf,

    /// Print nested maps whole instead of descending into them
    #[arg(long)]
    pub shallow_maps: bool,

    /// Print sets whole instead of one row per value
    #[arg(long)]
    pub shallow_sets: bool,
}

/// Arguments for the replay command
#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// JSON document whose root is an object
    pub file: PathBuf,

    /// Operations, applied in order:
    /// `add PATH=VALUE`, `set PATH=VALUE`, `delete PATH[=VALUE]`, `clear [PATH]`, `purge`.
    /// PATH is dotted (`a.b.c`) or a JSON array (`["a",0]`); VALUE is a JSON
    /// scalar, anything else is taken as text.
    #[arg(num_args = 1.., allow_hyphen_values = true)]
    pub ops: Vec<String>,

    /// Also print the resulting entries
    #[arg(long)]
    pub show_entries: bool,
}
