use clap::Parser;
use nestmap::MapOptions;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nestmap=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = MapOptions::new().auto_purge_empty_containers(cli.auto_purge);

    match &cli.command {
        Commands::Entries(args) => commands::entries::run(args, options, cli.format),
        Commands::Replay(args) => commands::replay::run(args, options, cli.format),
    }
}
