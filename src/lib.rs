//! `simple_archiver` — a library that packs filesystem entries into a single
//! container stream and reproduces them on extraction, delegating all
//! compression to an external child process.
//!
//! The library never walks a filesystem, never resolves a uid to a username
//! against the host's `/etc/passwd`, and never parses `argv` — those are the
//! `sarc` binary's job (§1, "external collaborators"). This crate accepts an
//! iterator of [`entry::EntrySource`] values and a [`identity::HostIdentityLookup`]
//! implementation from its caller.

pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod identity;
pub mod notify;
pub mod path_safety;
pub mod pipe_child;
pub mod reader;
pub mod selector;
pub mod writer;

pub use entry::{ArchivedBody, ArchivedEntry, EntryKind, EntrySource, Permissions, SymlinkTarget};
pub use error::{ArchiverError, Result};
pub use reader::{read_archive, ReadMode, ReadOptions, ReadSummary};
pub use writer::{create_archive, PreparedEntry, SortOrder, WriteOptions, WriteSummary};

/// Highest archive format version this build can read or write.
pub const MAX_FORMAT_VERSION: u16 = config::MAX_WRITE_VERSION;
