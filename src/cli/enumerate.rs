//! Filesystem walk (`walkdir`) that turns a list of input paths into
//! [`simple_archiver::EntrySource`] values. The library never does this
//! itself (§1, "external collaborators").

use std::fs;
use std::io::Read;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use simple_archiver::path_safety::{join_and_normalize, relative_symlink_target};
use simple_archiver::{EntryKind, EntrySource, Permissions, SymlinkTarget};

use super::host_identity::NixHostIdentity;

/// One filesystem item discovered during enumeration, with its path already
/// relativized against the shared root passed to [`enumerate`].
pub struct FsEntry {
    rel_path: String,
    abs_path: PathBuf,
    kind: EntryKind,
    permissions: Permissions,
    uid: u32,
    gid: u32,
    uname: Option<String>,
    gname: Option<String>,
    file_len: u64,
    symlink_target: SymlinkTarget,
}

impl EntrySource for FsEntry {
    fn path(&self) -> &str {
        &self.rel_path
    }
    fn kind(&self) -> EntryKind {
        self.kind
    }
    fn permissions(&self) -> Permissions {
        self.permissions
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
        self.file_len
    }
    fn open_reader(&self) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(&self.abs_path)?))
    }
    fn symlink_target(&self) -> SymlinkTarget {
        self.symlink_target.clone()
    }
}

/// Walks every path in `roots`, optionally recursing into directories, and
/// returns one [`FsEntry`] per regular file / symlink / (if `preserve_empty_dirs`)
/// empty directory encountered. Stored paths are relative to the nearest
/// common ancestor of `roots`, matching the "do not begin with `/`" entry
/// path invariant.
pub fn enumerate(
    roots: &[PathBuf],
    recursive: bool,
    preserve_empty_dirs: bool,
    host: &NixHostIdentity,
) -> std::io::Result<Vec<Box<dyn EntrySource>>> {
    let mut out: Vec<Box<dyn EntrySource>> = Vec::new();
    for root in roots {
        let base = root.parent().unwrap_or_else(|| Path::new(""));
        walk_one(root, base, recursive, preserve_empty_dirs, host, &mut out)?;
    }
    Ok(out)
}

fn walk_one(
    root: &Path,
    base: &Path,
    recursive: bool,
    preserve_empty_dirs: bool,
    host: &NixHostIdentity,
    out: &mut Vec<Box<dyn EntrySource>>,
) -> std::io::Result<()> {
    let walker = WalkDir::new(root).follow_links(false).max_depth(if recursive {
        usize::MAX
    } else {
        0
    });

    for result in walker {
        let dirent = result?;
        let path = dirent.path();
        let rel = path
            .strip_prefix(base)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let meta = fs::symlink_metadata(path)?;

        if meta.file_type().is_symlink() {
            out.push(Box::new(build_symlink_entry(path, &rel, &meta, host)?));
        } else if meta.file_type().is_file() {
            out.push(Box::new(build_file_entry(path, &rel, &meta, host)));
        } else if meta.file_type().is_dir() {
            if preserve_empty_dirs && dir_is_empty(path)? {
                out.push(Box::new(build_dir_entry(&rel, &meta, host)));
            }
        }
    }
    Ok(())
}

fn dir_is_empty(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

fn build_file_entry(
    path: &Path,
    rel: &str,
    meta: &fs::Metadata,
    host: &NixHostIdentity,
) -> FsEntry {
    FsEntry {
        rel_path: rel.to_string(),
        abs_path: path.to_path_buf(),
        kind: EntryKind::File,
        permissions: Permissions::from_mode(meta.mode()),
        uid: meta.uid(),
        gid: meta.gid(),
        uname: host.uid_to_name(meta.uid()),
        gname: host.gid_to_name(meta.gid()),
        file_len: meta.len(),
        symlink_target: SymlinkTarget::default(),
    }
}

fn build_dir_entry(rel: &str, meta: &fs::Metadata, host: &NixHostIdentity) -> FsEntry {
    FsEntry {
        rel_path: rel.to_string(),
        abs_path: PathBuf::new(),
        kind: EntryKind::EmptyDir,
        permissions: Permissions::from_mode(meta.mode()),
        uid: meta.uid(),
        gid: meta.gid(),
        uname: host.uid_to_name(meta.uid()),
        gname: host.gid_to_name(meta.gid()),
        file_len: 0,
        symlink_target: SymlinkTarget::default(),
    }
}

fn build_symlink_entry(
    path: &Path,
    rel: &str,
    meta: &fs::Metadata,
    host: &NixHostIdentity,
) -> std::io::Result<FsEntry> {
    let raw_target = fs::read_link(path)?;
    let link_dir = path.parent().unwrap_or_else(|| Path::new("/"));

    let (abs, rel_target) = if raw_target.is_absolute() {
        let abs = raw_target.to_string_lossy().replace('\\', "/");
        let link_abs = path.to_string_lossy().replace('\\', "/");
        let rel = relative_symlink_target(&link_abs, &abs);
        (Some(abs), Some(rel))
    } else {
        let rel = raw_target.to_string_lossy().replace('\\', "/");
        let joined = join_and_normalize(&link_dir.to_string_lossy().replace('\\', "/"), &rel);
        (Some(format!("/{joined}")), Some(rel))
    };

    Ok(FsEntry {
        rel_path: rel.to_string(),
        abs_path: path.to_path_buf(),
        kind: EntryKind::Symlink,
        permissions: Permissions::from_mode(meta.mode()),
        uid: meta.uid(),
        gid: meta.gid(),
        uname: host.uid_to_name(meta.uid()),
        gname: host.gid_to_name(meta.gid()),
        file_len: 0,
        symlink_target: SymlinkTarget {
            abs,
            rel: rel_target,
            prefer_absolute: raw_target.is_absolute(),
        },
    })
}
