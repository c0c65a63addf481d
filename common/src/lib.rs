//! Role and chunk assignment for nodes of a static DDP cluster.
//!
//! Every node reads the same roster file of `address:port` lines. Each
//! line is one process slot; a node finds its own lines by matching its
//! local address, and from their position derives its host index, the
//! data chunks its processes handle, and which of them is the master.

pub mod assignment;
pub mod config;
pub mod error;
pub mod resolver;
pub mod roster;

pub use assignment::Assignment;
pub use config::Config;
pub use error::{Result, RosterError};
pub use resolver::{ChunkLayout, Resolver, Role};
pub use roster::{Roster, RosterEntry};
