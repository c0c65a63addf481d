use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, Resolver};

mod args;
use args::Args;

mod report;

fn init_logging() {
    // stdout carries the values for the launcher, logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_resolver() -> Result<Resolver> {
    let config = Config::from_env().context("failed to load node configuration")?;
    info!(
        roster = %config.roster_path.display(),
        procs_per_node = config.procs_per_node,
        "Loaded configuration"
    );

    Ok(Resolver::new(config)?)
}

fn main() {
    init_logging();

    let args = Args::parse();

    let result = report::render(&args.command(), load_resolver);
    std::process::exit(report::finish(result, &mut std::io::stdout()));
}
