//! Host uid↔username / gid↔groupname lookup tables (§1, "external
//! collaborators"), backed by `nix::unistd::{User, Group}` the way
//! `jafreck-lz4r`'s `util/file_status.rs` uses `nix::unistd` for ownership
//! primitives.

use nix::unistd::{Gid, Group, Uid, User};

use simple_archiver::identity::HostIdentityLookup;

#[derive(Default)]
pub struct NixHostIdentity;

impl HostIdentityLookup for NixHostIdentity {
    fn uid_to_name(&self, uid: u32) -> Option<String> {
        User::from_uid(Uid::from_raw(uid)).ok().flatten().map(|u| u.name)
    }

    fn name_to_uid(&self, name: &str) -> Option<u32> {
        User::from_name(name).ok().flatten().map(|u| u.uid.as_raw())
    }

    fn gid_to_name(&self, gid: u32) -> Option<String> {
        Group::from_gid(Gid::from_raw(gid)).ok().flatten().map(|g| g.name)
    }

    fn name_to_gid(&self, name: &str) -> Option<u32> {
        Group::from_name(name).ok().flatten().map(|g| g.gid.as_raw())
    }
}
