//! Shared fixtures for the integration test suites.

use std::io::{Cursor, Read};

use simple_archiver::identity::HostIdentityLookup;
use simple_archiver::writer::PreparedEntry;
use simple_archiver::{EntryKind, EntrySource, Permissions, SymlinkTarget};

/// A host identity backend that never resolves anything, for archives built
/// and read entirely in memory with no dependency on the test machine's
/// `/etc/passwd`.
pub struct NullHost;

impl HostIdentityLookup for NullHost {
    fn uid_to_name(&self, _uid: u32) -> Option<String> {
        None
    }
    fn name_to_uid(&self, _name: &str) -> Option<u32> {
        None
    }
    fn gid_to_name(&self, _gid: u32) -> Option<String> {
        None
    }
    fn name_to_gid(&self, _name: &str) -> Option<u32> {
        None
    }
}

pub struct MemFile {
    pub path: String,
    pub contents: Vec<u8>,
    pub perms: Permissions,
    pub uid: u32,
    pub gid: u32,
    pub uname: Option<String>,
    pub gname: Option<String>,
}

impl EntrySource for MemFile {
    fn path(&self) -> &str {
        &self.path
    }
    fn kind(&self) -> EntryKind {
        EntryKind::File
    }
    fn permissions(&self) -> Permissions {
        self.perms
    }
    fn uid(&self) -> u32 {
        self.uid
    }
    fn gid(&self) -> u32 {
        self.gid
    }
    fn uname(&self) -> Option<&str> {
        self.uname.as_deref()
    }
    fn gname(&self) -> Option<&str> {
        self.gname.as_deref()
    }
    fn file_len(&self) -> u64 {
        self.contents.len() as u64
    }
    fn open_reader(&self) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.contents.clone())))
    }
}

pub struct MemSymlink {
    pub path: String,
    pub target: SymlinkTarget,
}

impl EntrySource for MemSymlink {
    fn path(&self) -> &str {
        &self.path
    }
    fn kind(&self) -> EntryKind {
        EntryKind::Symlink
    }
    fn permissions(&self) -> Permissions {
        Permissions::from_mode(0o777)
    }
    fn uid(&self) -> u32 {
        0
    }
    fn gid(&self) -> u32 {
        0
    }
    fn uname(&self) -> Option<&str> {
        None
    }
    fn gname(&self) -> Option<&str> {
        None
    }
    fn symlink_target(&self) -> SymlinkTarget {
        self.target.clone()
    }
}

pub struct MemEmptyDir {
    pub path: String,
}

impl EntrySource for MemEmptyDir {
    fn path(&self) -> &str {
        &self.path
    }
    fn kind(&self) -> EntryKind {
        EntryKind::EmptyDir
    }
    fn permissions(&self) -> Permissions {
        Permissions::from_mode(0o755)
    }
    fn uid(&self) -> u32 {
        0
    }
    fn gid(&self) -> u32 {
        0
    }
    fn uname(&self) -> Option<&str> {
        None
    }
    fn gname(&self) -> Option<&str> {
        None
    }
}

pub fn file(path: &str, contents: &[u8], mode: u32) -> PreparedEntry {
    let source = Box::new(MemFile {
        path: path.to_string(),
        contents: contents.to_vec(),
        perms: Permissions::from_mode(mode),
        uid: 0,
        gid: 0,
        uname: None,
        gname: None,
    });
    PreparedEntry::new(source, path.to_string(), 0, 0, None, None, false)
}

pub fn file_owned(path: &str, contents: &[u8], mode: u32, uid: u32, gid: u32, uname: &str, gname: &str) -> PreparedEntry {
    let source = Box::new(MemFile {
        path: path.to_string(),
        contents: contents.to_vec(),
        perms: Permissions::from_mode(mode),
        uid,
        gid,
        uname: Some(uname.to_string()),
        gname: Some(gname.to_string()),
    });
    PreparedEntry::new(
        source,
        path.to_string(),
        uid,
        gid,
        Some(uname.to_string()),
        Some(gname.to_string()),
        false,
    )
}

pub fn do_not_compress_file(path: &str, contents: &[u8], mode: u32) -> PreparedEntry {
    let source = Box::new(MemFile {
        path: path.to_string(),
        contents: contents.to_vec(),
        perms: Permissions::from_mode(mode),
        uid: 0,
        gid: 0,
        uname: None,
        gname: None,
    });
    PreparedEntry::new(source, path.to_string(), 0, 0, None, None, true)
}

pub fn relative_symlink(path: &str, rel_target: &str) -> PreparedEntry {
    let source = Box::new(MemSymlink {
        path: path.to_string(),
        target: SymlinkTarget {
            abs: None,
            rel: Some(rel_target.to_string()),
            prefer_absolute: false,
        },
    });
    PreparedEntry::new(source, path.to_string(), 0, 0, None, None, false)
}

pub fn empty_dir(path: &str) -> PreparedEntry {
    let source = Box::new(MemEmptyDir {
        path: path.to_string(),
    });
    PreparedEntry::new(source, path.to_string(), 0, 0, None, None, false)
}
