//! Core data types: entries, permission bits, symlink targets, and the
//! write-side source abstraction.
//!
//! The library never enumerates a filesystem itself (§3, "external
//! collaborators") — [`EntrySource`] is the narrow trait a caller (normally the
//! `sarc` binary's `walkdir`-based enumerator) implements to hand entries to
//! the writer.

use std::io::Read;

use crate::codec::Flags4;

/// What kind of filesystem item an entry represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
    EmptyDir,
}

/// The nine POSIX permission bits, stored as the low 9 bits of a `u32` in
/// `rwxrwxrwx` order (bit 8 = `u_r` down to bit 0 = `o_x`), independent of the
/// on-wire `Flags4` bit positions (§6.1), which interleave them with other
/// flags and are handled by [`Permissions::to_flags4`]/[`Permissions::from_flags4`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permissions(pub u32);

/// Bit order within `Flags4` for the nine permission bits, per §6.1: byte 0
/// bits 1-7 hold `u_r u_w u_x g_r g_w g_x o_r`, byte 1 bits 0-1 hold `o_w o_x`.
const PERM_POSITIONS: [(usize, u8); 9] = [
    (0, 1), // u_r
    (0, 2), // u_w
    (0, 3), // u_x
    (0, 4), // g_r
    (0, 5), // g_w
    (0, 6), // g_x
    (0, 7), // o_r
    (1, 0), // o_w
    (1, 1), // o_x
];

impl Permissions {
    pub fn from_mode(mode: u32) -> Self {
        Permissions(mode & 0o777)
    }

    pub fn mode(&self) -> u32 {
        self.0 & 0o777
    }

    /// Sets this entry's nine permission bits into `flags` at their §6.1
    /// positions, leaving the "is symlink"/"prefer absolute" bits untouched.
    pub fn write_into_flags4(&self, flags: &mut Flags4) {
        for (i, (byte, bit)) in PERM_POSITIONS.iter().enumerate() {
            let is_set = (self.0 >> (8 - i)) & 1 == 1;
            flags.set(*byte, *bit, is_set);
        }
    }

    /// Reads the nine permission bits out of `flags` at their §6.1 positions.
    pub fn read_from_flags4(flags: &Flags4) -> Self {
        let mut mode = 0u32;
        for (i, (byte, bit)) in PERM_POSITIONS.iter().enumerate() {
            if flags.get(*byte, *bit) {
                mode |= 1 << (8 - i);
            }
        }
        Permissions(mode)
    }

    /// Renders as `rwxrwxrwx`-style text, e.g. `rw-r--r--` for 0o644.
    pub fn to_rwx_string(&self) -> String {
        let chars = [
            (0o400, 'r'),
            (0o200, 'w'),
            (0o100, 'x'),
            (0o040, 'r'),
            (0o020, 'w'),
            (0o010, 'x'),
            (0o004, 'r'),
            (0o002, 'w'),
            (0o001, 'x'),
        ];
        chars
            .iter()
            .map(|(mask, c)| if self.0 & mask != 0 { *c } else { '-' })
            .collect()
    }
}

/// A symlink's recorded target(s). At least one of `abs`/`rel` must be
/// present for a valid entry (§3 invariant); both absent is `InvalidFile` on
/// read (§9 open question).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymlinkTarget {
    pub abs: Option<String>,
    pub rel: Option<String>,
    pub prefer_absolute: bool,
}

impl SymlinkTarget {
    /// Picks the target to use for `symlink(2)` per the prefer-abs flag,
    /// falling back to the other target if the preferred one is absent
    /// (§4.7 extract step for symlinks).
    pub fn preferred(&self) -> Option<&str> {
        let (first, second) = if self.prefer_absolute {
            (self.abs.as_deref(), self.rel.as_deref())
        } else {
            (self.rel.as_deref(), self.abs.as_deref())
        };
        first.or(second)
    }
}

/// One entry as read back from an archive (used for both `examine` output and
/// `extract` materialization).
#[derive(Clone, Debug)]
pub struct ArchivedEntry {
    pub path: String,
    pub permissions: Permissions,
    pub uid: u32,
    pub gid: u32,
    pub uname: Option<String>,
    pub gname: Option<String>,
    pub body: ArchivedBody,
}

#[derive(Clone, Debug)]
pub enum ArchivedBody {
    File { uncompressed_len: u64, raw: bool },
    Symlink(SymlinkTarget),
    EmptyDir,
}

impl ArchivedEntry {
    pub fn kind(&self) -> EntryKind {
        match self.body {
            ArchivedBody::File { .. } => EntryKind::File,
            ArchivedBody::Symlink(_) => EntryKind::Symlink,
            ArchivedBody::EmptyDir => EntryKind::EmptyDir,
        }
    }
}

/// The minimal shape the writer needs from one enumerated filesystem item.
/// Implemented by the `sarc` binary's `walkdir`-based enumerator; the library
/// never calls `std::fs::read_dir` itself.
pub trait EntrySource {
    fn path(&self) -> &str;
    fn kind(&self) -> EntryKind;
    fn permissions(&self) -> Permissions;
    fn uid(&self) -> u32;
    fn gid(&self) -> u32;
    fn uname(&self) -> Option<&str>;
    fn gname(&self) -> Option<&str>;

    /// Regular-file content length. Only meaningful when `kind() ==
    /// EntryKind::File`.
    fn file_len(&self) -> u64 {
        0
    }

    /// Opens the regular file's content for streaming. Only called when
    /// `kind() == EntryKind::File`.
    fn open_reader(&self) -> std::io::Result<Box<dyn Read + Send>> {
        unreachable!("open_reader called on a non-file EntrySource")
    }

    /// Recorded symlink target(s). Only meaningful when `kind() ==
    /// EntryKind::Symlink`.
    fn symlink_target(&self) -> SymlinkTarget {
        SymlinkTarget::default()
    }

    /// Whether this entry matches the "do-not-compress" extension set
    /// (§4.5); computed by the selector, cached here for the writer's
    /// chunking algorithm.
    fn do_not_compress(&self) -> bool {
        false
    }
}
