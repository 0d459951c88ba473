//! Identity remapper: uid/gid/username/groupname overlays applied on both
//! write and read (§4.4).
//!
//! The four "void*-keyed heterogeneous maps" of the original design become
//! four distinct, strongly-typed maps sharing one lookup method (§9 design
//! note). Host-table lookups (uid↔username, gid↔groupname) are an external
//! collaborator (§1) — callers supply a [`HostIdentityLookup`] implementation
//! rather than this module touching `/etc/passwd` directly.

use std::collections::HashMap;

use crate::error::{ArchiverError, Result};

/// Host-system uid/gid ↔ name lookup tables. The `sarc` binary implements
/// this over `nix::unistd::{User, Group}`; tests implement it over a fixed
/// in-memory table.
pub trait HostIdentityLookup {
    fn uid_to_name(&self, uid: u32) -> Option<String>;
    fn name_to_uid(&self, name: &str) -> Option<u32>;
    fn gid_to_name(&self, gid: u32) -> Option<String>;
    fn name_to_gid(&self, name: &str) -> Option<u32>;
}

/// Which of a pair of dimensions (numeric id vs. name) is authoritative at
/// extraction when the archive carries both (`--extract-prefer-uid` /
/// `--extract-prefer-gid` and their name-based defaults).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferDimension {
    Id,
    Name,
}

/// The four overlaid maps for one dimension (user or group).
#[derive(Default)]
pub struct IdentityMap {
    id_to_name: HashMap<u32, String>,
    name_to_id: HashMap<String, u32>,
    id_to_id: HashMap<u32, u32>,
    name_to_name: HashMap<String, String>,
    dimension: Dimension,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_id_to_name(&mut self, id: u32, name: &str) -> Result<()> {
        insert_no_conflict(&mut self.id_to_name, id, name.to_string(), "id->name")
    }

    pub fn add_name_to_id(&mut self, name: &str, id: u32) -> Result<()> {
        insert_no_conflict(&mut self.name_to_id, name.to_string(), id, "name->id")
    }

    pub fn add_id_to_id(&mut self, from: u32, to: u32) -> Result<()> {
        insert_no_conflict(&mut self.id_to_id, from, to, "id->id")
    }

    pub fn add_name_to_name(&mut self, from: &str, to: &str) -> Result<()> {
        insert_no_conflict(
            &mut self.name_to_name,
            from.to_string(),
            to.to_string(),
            "name->name",
        )
    }

    /// Resolves a source numeric id to an output id. Lookup order: id→id,
    /// else id→name→(host name→id), else identity (unchanged).
    pub fn resolve_id(&self, source_id: u32, host: &dyn HostIdentityLookup) -> u32 {
        if let Some(&mapped) = self.id_to_id.get(&source_id) {
            return mapped;
        }
        if let Some(name) = self.id_to_name.get(&source_id) {
            if let Some(mapped) = host_to_id(&self.host_lookup_kind(), host, name) {
                return mapped;
            }
        }
        source_id
    }

    /// Resolves a source name to an output id. Lookup order: name→id, else
    /// name→name→(host name→id), else host name→id.
    pub fn resolve_by_name(&self, source_name: &str, host: &dyn HostIdentityLookup) -> Option<u32> {
        if let Some(&id) = self.name_to_id.get(source_name) {
            return Some(id);
        }
        if let Some(new_name) = self.name_to_name.get(source_name) {
            if let Some(id) = host_to_id(&self.host_lookup_kind(), host, new_name) {
                return Some(id);
            }
        }
        host_to_id(&self.host_lookup_kind(), host, source_name)
    }

    // Both user and group maps share this struct; the concrete kind (uid vs.
    // gid host lookup) is supplied by the two thin wrapper types below.
    fn host_lookup_kind(&self) -> Dimension {
        self.dimension
    }
}

#[derive(Clone, Copy)]
enum Dimension {
    User,
    Group,
}

fn host_to_id(dim: &Dimension, host: &dyn HostIdentityLookup, name: &str) -> Option<u32> {
    match dim {
        Dimension::User => host.name_to_uid(name),
        Dimension::Group => host.name_to_gid(name),
    }
}

fn insert_no_conflict<K: std::hash::Hash + Eq + std::fmt::Debug, V: PartialEq + std::fmt::Debug>(
    map: &mut HashMap<K, V>,
    key: K,
    value: V,
    table: &str,
) -> Result<()> {
    if let Some(existing) = map.get(&key) {
        if *existing != value {
            return Err(ArchiverError::FailedToCreateMap(format!(
                "conflicting {table} mapping for {key:?}: {existing:?} vs {value:?}"
            )));
        }
        return Ok(());
    }
    map.insert(key, value);
    Ok(())
}

// `IdentityMap` doesn't know its own dimension by construction above; give it
// one via two constructors so `resolve_id`/`resolve_by_name` can dispatch to
// the right host-table half without the caller re-specifying it every call.
impl IdentityMap {
    pub fn for_users() -> Self {
        IdentityMap {
            dimension: Dimension::User,
            ..Default::default()
        }
    }

    pub fn for_groups() -> Self {
        IdentityMap {
            dimension: Dimension::Group,
            ..Default::default()
        }
    }

    /// Combines the numeric-id and name tracks per the authoritative
    /// dimension at extraction (`PreferDimension`), falling back to the
    /// other track if the preferred one doesn't resolve.
    pub fn resolve(
        &self,
        id: u32,
        name: Option<&str>,
        prefer: PreferDimension,
        host: &dyn HostIdentityLookup,
    ) -> u32 {
        match (prefer, name) {
            (PreferDimension::Name, Some(n)) => self
                .resolve_by_name(n, host)
                .unwrap_or_else(|| self.resolve_id(id, host)),
            _ => self.resolve_id(id, host),
        }
    }
}

// Dimension needs to be a field, so restate the struct with it included and
// keep `Default` derivable via an explicit impl instead of `#[derive]`.
impl Default for Dimension {
    fn default() -> Self {
        Dimension::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHost {
        uid_names: HashMap<u32, String>,
        uid_by_name: HashMap<String, u32>,
        gid_names: HashMap<u32, String>,
        gid_by_name: HashMap<String, u32>,
    }

    impl HostIdentityLookup for FakeHost {
        fn uid_to_name(&self, uid: u32) -> Option<String> {
            self.uid_names.get(&uid).cloned()
        }
        fn name_to_uid(&self, name: &str) -> Option<u32> {
            self.uid_by_name.get(name).copied()
        }
        fn gid_to_name(&self, gid: u32) -> Option<String> {
            self.gid_names.get(&gid).cloned()
        }
        fn name_to_gid(&self, name: &str) -> Option<u32> {
            self.gid_by_name.get(name).copied()
        }
    }

    fn empty_host() -> FakeHost {
        FakeHost {
            uid_names: HashMap::new(),
            uid_by_name: HashMap::new(),
            gid_names: HashMap::new(),
            gid_by_name: HashMap::new(),
        }
    }

    #[test]
    fn id_to_id_direct_mapping_wins() {
        let mut map = IdentityMap::for_users();
        map.add_id_to_id(1000, 2000).unwrap();
        assert_eq!(map.resolve_id(1000, &empty_host()), 2000);
    }

    #[test]
    fn identity_is_default_when_no_mapping_applies() {
        let map = IdentityMap::for_users();
        assert_eq!(map.resolve_id(42, &empty_host()), 42);
    }

    #[test]
    fn map_then_inverse_yields_original_uid() {
        let mut forward = IdentityMap::for_users();
        forward.add_id_to_id(10, 20).unwrap();
        let mut inverse = IdentityMap::for_users();
        inverse.add_id_to_id(20, 10).unwrap();

        let host = empty_host();
        let mapped = forward.resolve_id(10, &host);
        let restored = inverse.resolve_id(mapped, &host);
        assert_eq!(restored, 10);
    }

    #[test]
    fn conflicting_map_construction_is_fatal() {
        let mut map = IdentityMap::for_users();
        map.add_id_to_id(1, 2).unwrap();
        let err = map.add_id_to_id(1, 3).unwrap_err();
        assert!(matches!(err, ArchiverError::FailedToCreateMap(_)));
    }

    #[test]
    fn repeating_the_identical_mapping_is_not_a_conflict() {
        let mut map = IdentityMap::for_users();
        map.add_id_to_id(1, 2).unwrap();
        assert!(map.add_id_to_id(1, 2).is_ok());
    }

    #[test]
    fn id_to_name_falls_through_to_host_name_to_id() {
        let mut map = IdentityMap::for_users();
        map.add_id_to_name(5, "alice").unwrap();
        let mut host = empty_host();
        host.uid_by_name.insert("alice".to_string(), 99);
        assert_eq!(map.resolve_id(5, &host), 99);
    }

    #[test]
    fn resolve_by_name_order_name_to_id_then_name_to_name_then_host() {
        let mut map = IdentityMap::for_users();
        map.add_name_to_id("bob", 7).unwrap();
        let host = empty_host();
        assert_eq!(map.resolve_by_name("bob", &host), Some(7));
    }

    #[test]
    fn resolve_by_name_falls_back_to_host_lookup() {
        let map = IdentityMap::for_users();
        let mut host = empty_host();
        host.uid_by_name.insert("carol".to_string(), 11);
        assert_eq!(map.resolve_by_name("carol", &host), Some(11));
    }

    #[test]
    fn resolve_prefers_name_when_configured_and_present() {
        let mut map = IdentityMap::for_users();
        map.add_name_to_id("dave", 55).unwrap();
        map.add_id_to_id(1, 2).unwrap();
        let host = empty_host();
        assert_eq!(
            map.resolve(1, Some("dave"), PreferDimension::Name, &host),
            55
        );
    }

    #[test]
    fn resolve_falls_back_to_id_when_name_absent() {
        let mut map = IdentityMap::for_users();
        map.add_id_to_id(1, 2).unwrap();
        let host = empty_host();
        assert_eq!(map.resolve(1, None, PreferDimension::Name, &host), 2);
    }
}
