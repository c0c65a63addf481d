//! Node configuration, read once from the environment at startup.

use std::fmt::Display;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, RosterError};
use crate::resolver::ChunkLayout;

/// Roster file of `address:port` lines.
pub const ROSTER_VAR: &str = "CAD";
/// Cluster description file, handed to the launcher untouched.
pub const NODES_VAR: &str = "NODES";
pub const PROCS_PER_NODE_VAR: &str = "PROCS_PER_NODE";
pub const ITEM_COUNT_VAR: &str = "ITEMCOUNT";
pub const DDP_VAR: &str = "DDP";
pub const DDP_OPTS_VAR: &str = "DDP_OPTS";
pub const MIN_PORT_VAR: &str = "MIN_PORT";
pub const RESERVED_SLOTS_VAR: &str = "RESERVED_SLOTS";
pub const LOCAL_IP_VAR: &str = "DDP_LOCAL_IP";

/// Everything a node needs to work out its assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Path to the roster file the resolver reads.
    pub roster_path: PathBuf,

    /// Path to the cluster description file.
    pub nodes_path: PathBuf,

    /// Number of process slots on each host. Always > 0.
    pub procs_per_node: usize,

    /// Size of the dataset being processed.
    pub item_count: u64,

    /// The DDP launcher.
    pub ddp: String,

    /// Options passed through to the launcher verbatim.
    pub ddp_opts: String,

    /// Lowest port the launcher may hand out.
    pub min_port: u16,

    /// How slots map onto chunks.
    pub layout: ChunkLayout,

    /// Use this address instead of resolving the hostname.
    pub local_ip: Option<IpAddr>,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load the configuration through `lookup`, which maps a variable name
    /// to its value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let procs_per_node: usize =
            parse(PROCS_PER_NODE_VAR, &required(&lookup, PROCS_PER_NODE_VAR)?)?;
        if procs_per_node == 0 {
            return Err(config_error(PROCS_PER_NODE_VAR, "must be greater than 0"));
        }

        let reserved_slots = match optional(&lookup, RESERVED_SLOTS_VAR) {
            Some(raw) => parse(RESERVED_SLOTS_VAR, &raw)?,
            None => ChunkLayout::DEFAULT_RESERVED_SLOTS,
        };
        let layout = ChunkLayout::new(reserved_slots)
            .ok_or_else(|| config_error(RESERVED_SLOTS_VAR, "must be at least 1"))?;

        let local_ip = optional(&lookup, LOCAL_IP_VAR)
            .map(|raw| parse(LOCAL_IP_VAR, &raw))
            .transpose()?;

        let config = Config {
            roster_path: required(&lookup, ROSTER_VAR)?.into(),
            nodes_path: required(&lookup, NODES_VAR)?.into(),
            procs_per_node,
            item_count: parse(ITEM_COUNT_VAR, &required(&lookup, ITEM_COUNT_VAR)?)?,
            ddp: required(&lookup, DDP_VAR)?,
            ddp_opts: lookup(DDP_OPTS_VAR).unwrap_or_default(),
            min_port: parse(MIN_PORT_VAR, &required(&lookup, MIN_PORT_VAR)?)?,
            layout,
            local_ip,
        };

        debug!(?config, "loaded configuration");
        Ok(config)
    }
}

fn config_error(var: &'static str, reason: impl Into<String>) -> RosterError {
    RosterError::Config {
        var,
        reason: reason.into(),
    }
}

/// Blank values count as unset.
fn optional<F>(lookup: &F, var: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var).ok_or_else(|| config_error(var, "is not set"))
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| config_error(var, format!("has invalid value `{raw}`: {e}")))
}
