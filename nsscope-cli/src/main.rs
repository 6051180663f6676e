mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::Cli;

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })?;

    let cli = Cli::parse();

    // Show nsscope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .filter_module("nsscope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    let filter = cli.filter.to_filter();
    if cli.types {
        commands::types::run(&cli.paths, &filter, &cli.global)
    } else {
        commands::tally::run(&cli.paths, &filter, &cli.global)
    }
}
