use std::fs;
use std::net::IpAddr;
use std::path::Path;

use common::{ChunkLayout, Config, Resolver, Role, RosterEntry, RosterError};
use tempfile::TempDir;

const ROSTER: &str = "10.0.0.1:9000\n10.0.0.1:9001\n10.0.0.2:9000\n10.0.0.2:9001\n";

fn config(roster_path: &Path, procs_per_node: usize) -> Config {
    Config {
        roster_path: roster_path.to_path_buf(),
        nodes_path: roster_path.with_file_name("nodes"),
        procs_per_node,
        item_count: 4096,
        ddp: "/opt/ddp/bin/ddp".to_string(),
        ddp_opts: "-smp 2".to_string(),
        min_port: 9000,
        layout: ChunkLayout::default(),
        local_ip: None,
    }
}

fn resolver_for(dir: &TempDir, roster: &str, local: &str) -> Resolver {
    let path = dir.path().join("cad");
    fs::write(&path, roster).unwrap();
    Resolver::with_address(config(&path, 2), local.parse().unwrap())
}

#[test]
fn test_resolve_second_host() {
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&dir, ROSTER, "10.0.0.2");

    assert_eq!(
        resolver.find_local_roster_lines().unwrap(),
        vec![RosterEntry::new("10.0.0.2", 9000), RosterEntry::new("10.0.0.2", 9001)]
    );
    assert_eq!(resolver.compute_host_index().unwrap(), 1);
    assert_eq!(resolver.compute_chunk_numbers().unwrap(), vec![1, 1]);
    assert_eq!(resolver.compute_chunk_count().unwrap(), 2);
    assert_eq!(resolver.compute_roles().unwrap(), vec![Role::Slave, Role::Slave]);

    let assignment = resolver.resolve().unwrap();
    assert_eq!(assignment.host_index, 1);
    assert_eq!(assignment.chunk_numbers, vec![1, 1]);
    assert_eq!(assignment.chunk_count, 2);
    assert_eq!(assignment.roles, vec![Role::Slave, Role::Slave]);
    assert_eq!(assignment.local_lines.len(), 2);
    assert_eq!(assignment.item_count, 4096);
    assert_eq!(assignment.ddp_opts, "-smp 2");
}

#[test]
fn test_resolve_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&dir, ROSTER, "10.0.0.1");

    let first = resolver.resolve().unwrap();
    let second = resolver.resolve().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.roles, vec![Role::Master, Role::Slave]);
}

#[test]
fn test_absent_host() {
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&dir, ROSTER, "10.9.9.9");

    // An idle host is not an error for line lookup...
    assert!(resolver.find_local_roster_lines().unwrap().is_empty());

    // ...but it has no host index.
    assert!(matches!(
        resolver.compute_host_index(),
        Err(RosterError::NotFound { .. })
    ));
    assert!(matches!(resolver.resolve(), Err(RosterError::NotFound { .. })));
}

#[test]
fn test_short_roster() {
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&dir, "10.0.0.1:9000\n", "10.0.0.1");

    assert!(matches!(
        resolver.compute_chunk_count(),
        Err(RosterError::EmptyRoster { lines: 1, required: 2 })
    ));
    assert!(matches!(
        resolver.resolve(),
        Err(RosterError::EmptyRoster { .. })
    ));
}

#[test]
fn test_missing_roster_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist");
    let resolver = Resolver::with_address(config(&path, 2), "10.0.0.1".parse().unwrap());

    match resolver.compute_chunk_count() {
        Err(RosterError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected an IO error, got {other:?}"),
    }
}

#[test]
fn test_configured_local_ip_skips_lookup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cad");
    fs::write(&path, ROSTER).unwrap();

    let local: IpAddr = "10.0.0.2".parse().unwrap();
    let mut config = config(&path, 2);
    config.local_ip = Some(local);

    let resolver = Resolver::new(config).unwrap();
    assert_eq!(resolver.address(), local);
    assert_eq!(resolver.compute_host_index().unwrap(), 1);
}

#[test]
fn test_reads_roster_on_every_call() {
    let dir = TempDir::new().unwrap();
    let resolver = resolver_for(&dir, ROSTER, "10.0.0.2");
    assert_eq!(resolver.compute_chunk_count().unwrap(), 2);

    fs::write(dir.path().join("cad"), format!("{ROSTER}10.0.0.3:9000\n")).unwrap();
    assert_eq!(resolver.compute_chunk_count().unwrap(), 3);
}
