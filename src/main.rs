use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use isoprep::cli::{Cli, Commands};
use isoprep::commands::{convert, inspect, places};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).format_timestamp(None).init();

    match &cli.command {
        Commands::Places(args) => places::run(&cli, args),
        Commands::Inspect(args) => inspect::run(&cli, args),
        Commands::Convert(args) => convert::run(&cli, args),
    }
}
