use clap::{Parser, Subcommand};

//
// Cluster configuration comes from the environment (CAD, NODES,
// PROCS_PER_NODE, ...). The command line only picks what to print.
//
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the address this machine resolves to.
    Ip,
    /// Print this host's roster lines.
    Lines,
    /// Print this host's index in the cluster.
    Host,
    /// Print the chunk number of each local process slot.
    Chunks,
    /// Print the number of data chunks in the cluster.
    Count,
    /// Print the role (master or slave) of each local process slot.
    Roles,
    /// Print the full assignment for this node.
    Show {
        /// Print as JSON for the launcher to consume.
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    /// The chosen command, `show` when none is given.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Show { json: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_show() {
        let args = Args::try_parse_from(["ddp-node"]).unwrap();
        assert_eq!(args.command(), Commands::Show { json: false });
    }

    #[test]
    fn test_show_json() {
        let args = Args::try_parse_from(["ddp-node", "show", "--json"]).unwrap();
        assert_eq!(args.command(), Commands::Show { json: true });
    }

    #[test]
    fn test_subcommands() {
        let args = Args::try_parse_from(["ddp-node", "chunks"]).unwrap();
        assert_eq!(args.command(), Commands::Chunks);

        assert!(Args::try_parse_from(["ddp-node", "launch"]).is_err());
    }
}
