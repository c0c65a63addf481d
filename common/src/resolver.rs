//! Works out where the local machine sits in the roster and what it owns.
//!
//! Slot indices run over `[host_index, host_index + procs_per_node)`. The
//! free functions compute over an in-memory [`Roster`]; [`Resolver`] reads
//! the configured roster file on every call and delegates to them.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::ops::Range;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assignment::Assignment;
use crate::config::{Config, PROCS_PER_NODE_VAR};
use crate::error::{Result, RosterError};
use crate::roster::{Roster, RosterEntry};

/// What a process slot does in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Slave,
}

impl Role {
    /// Slot 0 is the master, everything else is a slave.
    pub fn for_slot(slot: usize) -> Role {
        if slot == 0 {
            Role::Master
        } else {
            Role::Slave
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

/// How roster slots map onto data chunks.
///
/// The first `reserved_slots` slots keep their own index as chunk number and
/// are not counted as chunks. Every later slot is shifted down so the worker
/// slots continue numbering right after the last reserved one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkLayout {
    reserved_slots: usize,
}

impl ChunkLayout {
    /// Master plus one coordination slot.
    pub const DEFAULT_RESERVED_SLOTS: usize = 2;

    /// Returns `None` if `reserved_slots` is 0.
    pub fn new(reserved_slots: usize) -> Option<Self> {
        (reserved_slots > 0).then_some(Self { reserved_slots })
    }

    pub fn reserved_slots(&self) -> usize {
        self.reserved_slots
    }

    pub fn is_reserved(&self, slot: usize) -> bool {
        slot < self.reserved_slots
    }

    pub fn chunk_number(&self, slot: usize) -> usize {
        if self.is_reserved(slot) {
            slot
        } else {
            slot + 1 - self.reserved_slots
        }
    }

    /// Number of data chunks in a roster of `lines` lines.
    pub fn chunk_count(&self, lines: usize) -> Result<usize> {
        lines
            .checked_sub(self.reserved_slots)
            .ok_or(RosterError::EmptyRoster {
                lines,
                required: self.reserved_slots,
            })
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            reserved_slots: Self::DEFAULT_RESERVED_SLOTS,
        }
    }
}

/// Resolve the local hostname to an address, preferring IPv4.
pub fn resolve_local_address() -> Result<IpAddr> {
    let hostname = hostname::get()
        .map_err(|e| RosterError::Resolution(format!("failed to get hostname: {e}")))?
        .into_string()
        .map_err(|name| RosterError::Resolution(format!("hostname {name:?} is not valid UTF-8")))?;

    let addresses: Vec<IpAddr> = (hostname.as_str(), 0)
        .to_socket_addrs()
        .map_err(|e| RosterError::Resolution(format!("failed to look up `{hostname}`: {e}")))?
        .map(|addr| addr.ip())
        .collect();

    let address = addresses
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
        .ok_or_else(|| RosterError::Resolution(format!("`{hostname}` has no addresses")))?;

    debug!(%hostname, %address, "resolved local address");
    Ok(address)
}

/// Roster entries belonging to `address`, in file order. Empty if the host
/// has no slots.
pub fn local_roster_lines(roster: &Roster, address: &IpAddr) -> Vec<RosterEntry> {
    roster
        .iter()
        .filter(|entry| entry.matches(address))
        .cloned()
        .collect()
}

/// Position of the first roster line for `address`, divided by
/// `procs_per_node`.
pub fn host_index(roster: &Roster, address: &IpAddr, procs_per_node: usize) -> Result<usize> {
    if procs_per_node == 0 {
        return Err(RosterError::Config {
            var: PROCS_PER_NODE_VAR,
            reason: "must be greater than 0".to_string(),
        });
    }

    let line = roster
        .iter()
        .position(|entry| entry.matches(address))
        .ok_or_else(|| RosterError::NotFound {
            address: address.to_string(),
        })?;

    debug!(%address, line, procs_per_node, "found first roster line");
    Ok(line / procs_per_node)
}

/// Slot indices owned by the host at `host_index`.
pub fn local_slots(host_index: usize, procs_per_node: usize) -> Range<usize> {
    host_index..host_index + procs_per_node
}

pub fn chunk_numbers(
    roster: &Roster,
    address: &IpAddr,
    procs_per_node: usize,
    layout: &ChunkLayout,
) -> Result<Vec<usize>> {
    let host = host_index(roster, address, procs_per_node)?;
    Ok(chunk_numbers_for_host(host, procs_per_node, layout))
}

pub fn chunk_numbers_for_host(
    host_index: usize,
    procs_per_node: usize,
    layout: &ChunkLayout,
) -> Vec<usize> {
    local_slots(host_index, procs_per_node)
        .map(|slot| layout.chunk_number(slot))
        .collect()
}

pub fn chunk_count(roster: &Roster, layout: &ChunkLayout) -> Result<usize> {
    layout.chunk_count(roster.len())
}

pub fn roles(roster: &Roster, address: &IpAddr, procs_per_node: usize) -> Result<Vec<Role>> {
    let host = host_index(roster, address, procs_per_node)?;
    Ok(roles_for_host(host, procs_per_node))
}

pub fn roles_for_host(host_index: usize, procs_per_node: usize) -> Vec<Role> {
    local_slots(host_index, procs_per_node)
        .map(Role::for_slot)
        .collect()
}

/// Answers "where am I in the cluster, and what do I own?" for one node.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Config,
    address: IpAddr,
}

impl Resolver {
    /// Build a resolver, taking the local address from the configuration
    /// override or, failing that, from a hostname lookup.
    pub fn new(config: Config) -> Result<Self> {
        let address = match config.local_ip {
            Some(address) => {
                debug!(%address, "using configured local address");
                address
            }
            None => resolve_local_address()?,
        };
        Ok(Self::with_address(config, address))
    }

    pub fn with_address(config: Config, address: IpAddr) -> Self {
        Self { config, address }
    }

    /// The local machine's address.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Read the roster file in full.
    pub fn roster(&self) -> Result<Roster> {
        Roster::load(&self.config.roster_path)
    }

    pub fn find_local_roster_lines(&self) -> Result<Vec<RosterEntry>> {
        Ok(local_roster_lines(&self.roster()?, &self.address))
    }

    pub fn compute_host_index(&self) -> Result<usize> {
        host_index(&self.roster()?, &self.address, self.config.procs_per_node)
    }

    pub fn compute_chunk_numbers(&self) -> Result<Vec<usize>> {
        chunk_numbers(
            &self.roster()?,
            &self.address,
            self.config.procs_per_node,
            &self.config.layout,
        )
    }

    pub fn compute_chunk_count(&self) -> Result<usize> {
        chunk_count(&self.roster()?, &self.config.layout)
    }

    pub fn compute_roles(&self) -> Result<Vec<Role>> {
        roles(&self.roster()?, &self.address, self.config.procs_per_node)
    }

    /// Compute the whole assignment from a single read of the roster.
    pub fn resolve(&self) -> Result<Assignment> {
        let roster = self.roster()?;
        let procs_per_node = self.config.procs_per_node;

        let local_lines = local_roster_lines(&roster, &self.address);
        if local_lines.is_empty() {
            warn!(address = %self.address, "no roster lines for this host");
        }

        let chunk_count = chunk_count(&roster, &self.config.layout)?;
        let host_index = host_index(&roster, &self.address, procs_per_node)?;

        let assignment = Assignment {
            address: self.address,
            local_lines,
            host_index,
            chunk_numbers: chunk_numbers_for_host(host_index, procs_per_node, &self.config.layout),
            chunk_count,
            roles: roles_for_host(host_index, procs_per_node),
            nodes_path: self.config.nodes_path.clone(),
            ddp: self.config.ddp.clone(),
            ddp_opts: self.config.ddp_opts.clone(),
            item_count: self.config.item_count,
            min_port: self.config.min_port,
        };

        info!(
            address = %assignment.address,
            host_index = assignment.host_index,
            chunk_count = assignment.chunk_count,
            chunks = ?assignment.chunk_numbers,
            "resolved node assignment"
        );
        Ok(assignment)
    }
}
