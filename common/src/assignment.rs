use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::Serialize;

use crate::resolver::Role;
use crate::roster::RosterEntry;

/// Everything the DDP launcher needs to start this node's processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Local machine address used to match roster lines.
    pub address: IpAddr,

    /// This host's roster lines, in file order.
    pub local_lines: Vec<RosterEntry>,

    pub host_index: usize,

    /// One chunk number per local slot.
    pub chunk_numbers: Vec<usize>,

    /// Number of data chunks across the cluster.
    pub chunk_count: usize,

    /// One role per local slot.
    pub roles: Vec<Role>,

    // Passed through from the configuration for the launcher.
    pub nodes_path: PathBuf,
    pub ddp: String,
    pub ddp_opts: String,
    pub item_count: u64,
    pub min_port: u16,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "address: {}", self.address)?;
        writeln!(f, "host index: {}", self.host_index)?;
        writeln!(f, "chunk count: {}", self.chunk_count)?;
        writeln!(f, "item count: {}", self.item_count)?;
        writeln!(f, "launcher: {} {}", self.ddp, self.ddp_opts)?;
        writeln!(f, "nodes: {}", self.nodes_path.display())?;
        writeln!(f, "min port: {}", self.min_port)?;
        write!(f, "slots:")?;
        for (role, chunk) in self.roles.iter().zip(&self.chunk_numbers) {
            write!(f, "\n  {role} chunk={chunk}")?;
        }
        Ok(())
    }
}
