//! The roster: an ordered list of `address:port` lines, one per process
//! slot in the cluster.

use std::fmt;
use std::fs;
use std::net::{IpAddr, Ipv6Addr};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, RosterError};

/// A single roster line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RosterEntry {
    /// IP literal or hostname. IPv6 literals are stored without brackets.
    pub address: String,

    pub port: u16,
}

impl RosterEntry {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Whether this entry belongs to the machine with address `ip`.
    ///
    /// IP literals are compared as addresses, anything else as text.
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self.address.parse::<IpAddr>() {
            Ok(address) => address == *ip,
            Err(_) => self.address == ip.to_string(),
        }
    }

    /// Parse one `address:port` line. `line` is 1-based, for error reporting.
    fn parse_line(line: usize, content: &str) -> Result<Self> {
        let malformed = || RosterError::MalformedEntry {
            line,
            content: content.to_string(),
        };

        let (address, port) = content.rsplit_once(':').ok_or_else(malformed)?;
        let address = address.trim();
        if address.is_empty() {
            return Err(malformed());
        }

        // `[v6]:port`; a bracketed address must be an IPv6 literal.
        let address = match address.strip_prefix('[') {
            Some(rest) => {
                let inner = rest.strip_suffix(']').ok_or_else(malformed)?;
                inner.parse::<Ipv6Addr>().map_err(|_| malformed())?;
                inner
            }
            None if address.contains(']') => return Err(malformed()),
            None => address,
        };
        let port = port.trim().parse().map_err(|_| malformed())?;

        Ok(Self::new(address, port))
    }
}

impl fmt::Display for RosterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// The roster file's contents, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Read and parse the roster file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let roster = Self::parse(&text)?;
        debug!(path = %path.display(), entries = roster.len(), "loaded roster");
        Ok(roster)
    }

    /// Parse roster text. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let entries = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line, content)| RosterEntry::parse_line(line, content))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }
}
