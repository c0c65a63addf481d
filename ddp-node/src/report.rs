use std::io::Write;

use anyhow::{Context, Result};
use common::{resolver, Resolver};
use tracing::error;

use crate::args::Commands;

fn join<T: ToString>(values: &[T], separator: &str) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Compute what `command` asks for and format it for stdout.
///
/// `load` builds the resolver from the cluster configuration. It is only
/// called by commands that read the roster, so `ip` works without one.
pub fn render<F>(command: &Commands, load: F) -> Result<String>
where
    F: FnOnce() -> Result<Resolver>,
{
    let output = match command {
        Commands::Ip => resolver::resolve_local_address()?.to_string(),
        Commands::Lines => join(&load()?.find_local_roster_lines()?, "\n"),
        Commands::Host => load()?.compute_host_index()?.to_string(),
        Commands::Chunks => join(&load()?.compute_chunk_numbers()?, " "),
        Commands::Count => load()?.compute_chunk_count()?.to_string(),
        Commands::Roles => join(&load()?.compute_roles()?, " "),
        Commands::Show { json: false } => load()?.resolve()?.to_string(),
        Commands::Show { json: true } => serde_json::to_string_pretty(&load()?.resolve()?)
            .context("failed to serialize assignment")?,
    };
    Ok(output)
}

/// Print the output, or log the error once. Returns the exit status.
pub fn finish(result: Result<String>, out: &mut impl Write) -> i32 {
    let printed = result.and_then(|output| {
        writeln!(out, "{output}")?;
        out.flush()?;
        Ok(())
    });

    match printed {
        Ok(()) => 0,
        Err(err) => {
            error!("Node cannot join the cluster: {err:#}");
            1
        }
    }
}
