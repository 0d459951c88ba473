//! The `sarc` binary's thin shell around `simple_archiver`: argument parsing,
//! filesystem enumeration, and host identity lookups. None of this lives in
//! the library crate (§1, "external collaborators").

pub mod args;
pub mod enumerate;
pub mod host_identity;
