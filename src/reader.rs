//! Archive reader: header parse, version dispatch, streaming through the
//! decompressor, and entry materialization (§4.7).
//!
//! Mirrors [`crate::writer`]'s `FormatTraits`-parameterized approach: one
//! shared entry-record decode path for all six versions instead of six
//! near-duplicate parsers (§9 design note).

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, Flags4};
use crate::config::MAGIC;
use crate::entry::{ArchivedBody, ArchivedEntry, Permissions, SymlinkTarget};
use crate::error::{ArchiverError, Result};
use crate::format::{ChunkSizeFields, FormatTraits};
use crate::identity::{HostIdentityLookup, IdentityMap, PreferDimension};
use crate::notify;
use crate::path_safety;
use crate::pipe_child::{is_cancelled, ChildDirection, ChildRunner};
use crate::selector::Selector;

/// What the caller wants done with each entry as it is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// List entries to stderr; consume body bytes without writing them
    /// anywhere (§4.7 point 4).
    Examine,
    /// Materialize entries onto the filesystem under `cwd` (§4.7 point 5).
    Extract,
}

pub struct ReadOptions {
    pub mode: ReadMode,
    pub cwd: PathBuf,
    pub decompressor_override: Option<String>,
    pub selector: Selector,
    pub allow_double_dot: bool,
    pub overwrite_extract: bool,
    pub user_map: IdentityMap,
    pub group_map: IdentityMap,
    pub prefer: PreferDimension,
    pub dir_permissions: Option<u32>,
    pub file_permissions: Option<u32>,
    pub empty_dir_permissions: Option<u32>,
    pub is_root: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            mode: ReadMode::Examine,
            cwd: PathBuf::from("."),
            decompressor_override: None,
            selector: Selector::new(),
            allow_double_dot: false,
            overwrite_extract: false,
            user_map: IdentityMap::for_users(),
            group_map: IdentityMap::for_groups(),
            prefer: PreferDimension::Id,
            dir_permissions: None,
            file_permissions: None,
            empty_dir_permissions: None,
            is_root: false,
        }
    }
}

pub struct ReadSummary {
    pub entries_seen: usize,
    pub entries_materialized: usize,
}

struct DecodedFileHeader {
    path: String,
    flags: Flags4,
    uid: u32,
    gid: u32,
    uname: Option<String>,
    gname: Option<String>,
    file_size: u64,
}

struct DecodedLink {
    path: String,
    prefer_absolute: bool,
    target: SymlinkTarget,
    uname: Option<String>,
    gname: Option<String>,
}

struct DecodedDir {
    path: String,
    flags: Flags4,
    uname: Option<String>,
    gname: Option<String>,
}

/// Reads and processes a complete archive from `input` per `opts.mode`.
pub fn read_archive(
    input: &mut dyn Read,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
) -> Result<ReadSummary> {
    let mut magic = [0u8; 18];
    codec::read_exact(input, &mut magic)?;
    if &magic != MAGIC {
        return Err(ArchiverError::InvalidFile(
            "magic bytes do not match SIMPLE_ARCHIVE_VER".to_string(),
        ));
    }
    let version = codec::read_u16(input)?;
    let traits = FormatTraits::for_version(version)?;

    let prefix = if traits.has_prefix {
        let p = codec::read_str(input)?;
        if p.is_empty() {
            None
        } else {
            Some(p)
        }
    } else {
        None
    };

    let header_flags = Flags4::read(input)?;
    let has_compressor = header_flags.get(0, 0);
    let embedded_decompressor;
    if has_compressor {
        let _compressor = codec::read_str(input)?;
        embedded_decompressor = Some(codec::read_str(input)?);
    } else {
        embedded_decompressor = None;
    }
    let decompressor = opts
        .decompressor_override
        .clone()
        .or(embedded_decompressor);

    let mut seen = 0usize;
    let mut materialized = 0usize;

    if !traits.has_chunking {
        read_v0_body(
            input,
            &traits,
            decompressor.as_deref(),
            prefix.as_deref(),
            opts,
            host,
            &mut seen,
            &mut materialized,
        )?;
    } else {
        let links = read_links_section(input, &traits)?;
        let dirs = if traits.has_empty_dir_section {
            read_dirs_section(input, &traits)?
        } else {
            Vec::new()
        };

        for dir in &dirs {
            process_dir(dir, prefix.as_deref(), opts, host, &mut seen, &mut materialized)?;
        }
        for link in &links {
            process_link(link, prefix.as_deref(), opts, host, &mut seen, &mut materialized)?;
        }

        read_chunks_section(input, &traits, decompressor.as_deref(), prefix.as_deref(), opts, host, &mut seen, &mut materialized)?;
    }

    notify::finish_progress();
    Ok(ReadSummary {
        entries_seen: seen,
        entries_materialized: materialized,
    })
}

fn strip_prefix<'a>(prefix: Option<&str>, path: &'a str) -> &'a str {
    match prefix {
        Some(p) if !p.is_empty() => path.strip_prefix(p).unwrap_or(path),
        _ => path,
    }
}

// ---------------------------------------------------------------------
// v0: flat per-entry list.
// ---------------------------------------------------------------------

fn read_v0_body(
    input: &mut dyn Read,
    _traits: &FormatTraits,
    decompressor: Option<&str>,
    prefix: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    let count = codec::read_u32(input)?;
    for i in 0..count {
        if is_cancelled() {
            return Err(ArchiverError::SigInt);
        }
        let raw_path = codec::read_str(input)?;
        let flags = Flags4::read(input)?;
        let is_symlink = flags.get(0, 0);
        let permissions = Permissions::read_from_flags4(&flags);

        let path = strip_prefix(prefix, &raw_path).to_string();

        if is_symlink {
            let abs = codec::read_opt_str(input)?;
            let rel = codec::read_opt_str(input)?;
            if abs.is_none() && rel.is_none() {
                return Err(ArchiverError::InvalidFile(format!(
                    "symlink {path} has neither absolute nor relative target"
                )));
            }
            let prefer_absolute = flags.get(1, 2);
            let entry = ArchivedEntry {
                path,
                permissions,
                uid: 0,
                gid: 0,
                uname: None,
                gname: None,
                body: ArchivedBody::Symlink(SymlinkTarget {
                    abs,
                    rel,
                    prefer_absolute,
                }),
            };
            handle_entry(entry, opts, host, seen, materialized)?;
        } else {
            let len = codec::read_u64(input)?;
            match decompressor {
                None => {
                    let entry = ArchivedEntry {
                        path,
                        permissions,
                        uid: 0,
                        gid: 0,
                        uname: None,
                        gname: None,
                        body: ArchivedBody::File {
                            uncompressed_len: len,
                            raw: true,
                        },
                    };
                    materialize_or_skip_file_body(&entry, input, None, opts, host, seen, materialized)?;
                }
                Some(decompressor) => {
                    // v0 has no per-file size field beyond the compressed
                    // byte count; the decompressed length falls out of the
                    // decompressor's own output (§4.6/§4.7).
                    let mut bounded = BoundedReader::new(input, len);
                    let mut runner = ChildRunner::spawn(decompressor, ChildDirection::Decompress)?;
                    let mut decompressed = Vec::new();
                    {
                        let mut sink = std::io::Cursor::new(&mut decompressed);
                        runner.transfer(&mut bounded, &mut sink)?;
                    }
                    io_drain(&mut bounded)?;
                    let entry = ArchivedEntry {
                        path,
                        permissions,
                        uid: 0,
                        gid: 0,
                        uname: None,
                        gname: None,
                        body: ArchivedBody::File {
                            uncompressed_len: decompressed.len() as u64,
                            raw: false,
                        },
                    };
                    let mut cursor = std::io::Cursor::new(decompressed);
                    materialize_or_skip_file_body(&entry, &mut cursor, None, opts, host, seen, materialized)?;
                }
            }
        }
        notify::report_progress((i + 1) as u64, count as u64);
    }
    Ok(())
}

// ---------------------------------------------------------------------
// v1-v5: link section, optional dir section, chunked file section.
// ---------------------------------------------------------------------

fn read_links_section(input: &mut dyn Read, traits: &FormatTraits) -> Result<Vec<DecodedLink>> {
    let count = codec::read_u32(input)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let link_flags = codec::read_u16(input)?;
        let path = codec::read_str(input)?;
        let abs = codec::read_opt_str(input)?;
        let rel = codec::read_opt_str(input)?;
        if abs.is_none() && rel.is_none() {
            return Err(ArchiverError::InvalidFile(format!(
                "symlink {path} has neither absolute nor relative target"
            )));
        }
        let (uname, gname) = if traits.has_uname_gname {
            (codec::read_opt_str(input)?, codec::read_opt_str(input)?)
        } else {
            (None, None)
        };
        out.push(DecodedLink {
            path,
            prefer_absolute: link_flags & 1 != 0,
            target: SymlinkTarget {
                abs,
                rel,
                prefer_absolute: link_flags & 1 != 0,
            },
            uname,
            gname,
        });
    }
    Ok(out)
}

fn read_dirs_section(input: &mut dyn Read, traits: &FormatTraits) -> Result<Vec<DecodedDir>> {
    let count = codec::read_u32(input)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let _dir_flags = codec::read_u16(input)?;
        let path = codec::read_str(input)?;
        let flags = Flags4::read(input)?;
        let (uname, gname) = if traits.has_uname_gname {
            (codec::read_opt_str(input)?, codec::read_opt_str(input)?)
        } else {
            (None, None)
        };
        out.push(DecodedDir {
            path,
            flags,
            uname,
            gname,
        });
    }
    Ok(out)
}

fn process_link(
    link: &DecodedLink,
    prefix: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    let path = strip_prefix(prefix, &link.path).to_string();
    let entry = ArchivedEntry {
        path,
        permissions: Permissions::from_mode(0o777),
        uid: 0,
        gid: 0,
        uname: link.uname.clone(),
        gname: link.gname.clone(),
        body: ArchivedBody::Symlink(SymlinkTarget {
            abs: link.target.abs.clone(),
            rel: link.target.rel.clone(),
            prefer_absolute: link.prefer_absolute,
        }),
    };
    handle_entry(entry, opts, host, seen, materialized)
}

fn process_dir(
    dir: &DecodedDir,
    prefix: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    let path = strip_prefix(prefix, &dir.path).to_string();
    let entry = ArchivedEntry {
        path,
        permissions: Permissions::read_from_flags4(&dir.flags),
        uid: 0,
        gid: 0,
        uname: dir.uname.clone(),
        gname: dir.gname.clone(),
        body: ArchivedBody::EmptyDir,
    };
    handle_entry(entry, opts, host, seen, materialized)
}

fn read_chunks_section(
    input: &mut dyn Read,
    traits: &FormatTraits,
    decompressor: Option<&str>,
    prefix: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    let chunk_count = codec::read_u32(input)?;
    let mut total_ticked = 0u64;
    for _ in 0..chunk_count {
        read_one_chunk(input, traits, decompressor, prefix, opts, host, seen, materialized, &mut total_ticked)?;
    }
    Ok(())
}

fn read_one_chunk(
    input: &mut dyn Read,
    traits: &FormatTraits,
    decompressor: Option<&str>,
    prefix: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
    total_ticked: &mut u64,
) -> Result<()> {
    let file_count = codec::read_u16(input)?;
    let mut headers = Vec::with_capacity(file_count as usize);
    for _ in 0..file_count {
        let path = codec::read_str(input)?;
        let flags = Flags4::read(input)?;
        let uid = codec::read_u32(input)?;
        let gid = codec::read_u32(input)?;
        let (uname, gname) = if traits.has_uname_gname {
            (codec::read_opt_str(input)?, codec::read_opt_str(input)?)
        } else {
            (None, None)
        };
        let file_size = codec::read_u64(input)?;
        headers.push(DecodedFileHeader {
            path,
            flags,
            uid,
            gid,
            uname,
            gname,
            file_size,
        });
    }

    let (uncompressed_size, compressed_size) = match traits.chunk_size_fields {
        ChunkSizeFields::CompressedOnly => {
            let c = codec::read_u64(input)?;
            (headers.iter().map(|h| h.file_size).sum(), c)
        }
        ChunkSizeFields::UncompressedAndCompressed => {
            let u = codec::read_u64(input)?;
            let c = codec::read_u64(input)?;
            (u, c)
        }
    };
    let _ = uncompressed_size;

    let mut bounded = BoundedReader::new(input, compressed_size);

    // Mirrors the writer's chunk-level raw decision (§4.5, §4.6): a chunk is
    // stored uncompressed either because no compressor is configured at all,
    // or because it is a do-not-compress singleton chunk. v5 additionally
    // carries an explicit per-file bit; earlier versions re-derive the same
    // singleton-do-not-compress fact from the selector, which both sides of
    // a create/extract pair are expected to configure identically.
    let raw_chunk = decompressor.is_none()
        || (headers.len() == 1
            && ((traits.has_per_file_raw_bit && headers[0].flags.get(FILE_RAW_BIT.0, FILE_RAW_BIT.1))
                || (!traits.has_per_file_raw_bit && opts.selector.is_do_not_compress(&headers[0].path))));

    if raw_chunk {
        for header in &headers {
            let entry = decoded_file_entry(header, prefix);
            materialize_or_skip_file_body(&entry, &mut bounded, None, opts, host, seen, materialized)?;
            *total_ticked += 1;
            notify::report_progress(*total_ticked, *total_ticked);
        }
        // Drain whatever remains of the declared compressed size that wasn't consumed.
        io_drain(&mut bounded)?;
    } else {
        let decompressor = decompressor.ok_or(ArchiverError::NoDecompressor)?;
        let mut runner = ChildRunner::spawn(decompressor, ChildDirection::Decompress)?;
        let expected_total: u64 = headers.iter().map(|h| h.file_size).sum();
        let mut decompressed = Vec::new();
        {
            let mut sink = std::io::Cursor::new(&mut decompressed);
            runner.transfer(&mut bounded, &mut sink)?;
        }
        io_drain(&mut bounded)?;
        if (decompressed.len() as u64) < expected_total {
            return Err(ArchiverError::InternalError(format!(
                "decompressor produced {} bytes, expected at least {}",
                decompressed.len(),
                expected_total
            )));
        }
        if decompressed.len() as u64 > expected_total {
            notify::warn("decompressor produced more bytes than declared file sizes; surplus ignored");
        }
        let mut cursor = std::io::Cursor::new(decompressed);
        for header in &headers {
            let entry = decoded_file_entry(header, prefix);
            materialize_or_skip_file_body(&entry, &mut cursor, None, opts, host, seen, materialized)?;
            *total_ticked += 1;
            notify::report_progress(*total_ticked, *total_ticked);
        }
    }
    Ok(())
}

fn io_drain(r: &mut dyn Read) -> Result<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf).map_err(ArchiverError::from)?;
        if n == 0 {
            break;
        }
    }
    Ok(())
}

const FILE_RAW_BIT: (usize, u8) = (1, 3);

fn decoded_file_entry(header: &DecodedFileHeader, prefix: Option<&str>) -> ArchivedEntry {
    let path = strip_prefix(prefix, &header.path).to_string();
    let raw = header.flags.get(FILE_RAW_BIT.0, FILE_RAW_BIT.1);
    ArchivedEntry {
        path,
        permissions: Permissions::read_from_flags4(&header.flags),
        uid: header.uid,
        gid: header.gid,
        uname: header.uname.clone(),
        gname: header.gname.clone(),
        body: ArchivedBody::File {
            uncompressed_len: header.file_size,
            raw,
        },
    }
}

/// Wraps a `Read` so exactly `remaining` bytes can be pulled from it, then
/// EOFs. Used to bound a chunk's compressed bytes within the larger archive
/// stream (§4.7 decompressor drain invariant; §9 open question on declared
/// sizes exceeding the remaining stream).
struct BoundedReader<'a> {
    inner: &'a mut dyn Read,
    remaining: u64,
}

impl<'a> BoundedReader<'a> {
    fn new(inner: &'a mut dyn Read, remaining: u64) -> Self {
        BoundedReader { inner, remaining }
    }
}

impl<'a> Read for BoundedReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let cap = buf.len().min(self.remaining as usize);
        let n = self.inner.read(&mut buf[..cap])?;
        if n == 0 && self.remaining > 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "declared chunk size exceeds remaining stream length",
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

// ---------------------------------------------------------------------
// Shared entry processing: selection, validation, remapping, dispatch.
// ---------------------------------------------------------------------

fn handle_entry(
    entry: ArchivedEntry,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    *seen += 1;
    if opts.mode == ReadMode::Extract && !opts.selector.accepts(&entry.path) {
        return Ok(());
    }
    let normalized = path_safety::validate_path(&entry.path, opts.allow_double_dot)?;
    match opts.mode {
        ReadMode::Examine => {
            examine_entry(&entry);
        }
        ReadMode::Extract => {
            extract_entry(&entry, &normalized, opts, host)?;
            *materialized += 1;
        }
    }
    Ok(())
}

fn materialize_or_skip_file_body(
    entry: &ArchivedEntry,
    body_source: &mut dyn Read,
    _decompressor: Option<&str>,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
    seen: &mut usize,
    materialized: &mut usize,
) -> Result<()> {
    *seen += 1;
    let ArchivedBody::File { uncompressed_len, .. } = entry.body else {
        unreachable!("materialize_or_skip_file_body called on a non-file entry");
    };

    let accepted = opts.mode != ReadMode::Extract || opts.selector.accepts(&entry.path);
    let path_ok = path_safety::validate_path(&entry.path, opts.allow_double_dot);

    if opts.mode == ReadMode::Examine {
        examine_entry(entry);
        drain_exact(body_source, uncompressed_len)?;
        return Ok(());
    }

    if !accepted || path_ok.is_err() {
        drain_exact(body_source, uncompressed_len)?;
        return Ok(());
    }
    let normalized = path_ok.unwrap();

    let target = match path_safety::resolve_within_cwd(&opts.cwd, &normalized) {
        Ok(p) => p,
        Err(e) => {
            drain_exact(body_source, uncompressed_len)?;
            return Err(e);
        }
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(ArchiverError::from)?;
        apply_dir_permissions(parent, opts);
    }

    if target.exists() && !opts.overwrite_extract {
        notify::warn(&format!("skipping existing file {}", target.display()));
        drain_exact(body_source, uncompressed_len)?;
        return Ok(());
    }
    if target.exists() {
        let _ = fs::remove_file(&target);
    }

    let mut out = fs::File::create(&target).map_err(ArchiverError::from)?;
    let mut limited = body_source.take(uncompressed_len);
    std::io::copy(&mut limited, &mut out).map_err(ArchiverError::FailedToWrite)?;

    apply_file_permissions(&target, entry, opts, host);
    *materialized += 1;
    Ok(())
}

fn drain_exact(r: &mut dyn Read, len: u64) -> Result<()> {
    let mut limited = r.take(len);
    io_drain(&mut limited)
}

fn examine_entry(entry: &ArchivedEntry) {
    match &entry.body {
        ArchivedBody::File { uncompressed_len, raw } => {
            notify::display_level(
                2,
                &format!(
                    "{}  {} bytes  {}{}\n",
                    entry.path,
                    uncompressed_len,
                    entry.permissions.to_rwx_string(),
                    if *raw { "  (stored)" } else { "" }
                ),
            );
        }
        ArchivedBody::Symlink(target) => {
            notify::display_level(
                2,
                &format!(
                    "{} -> {}\n",
                    entry.path,
                    target.preferred().unwrap_or("?")
                ),
            );
        }
        ArchivedBody::EmptyDir => {
            notify::display_level(
                2,
                &format!("{}/  {}\n", entry.path, entry.permissions.to_rwx_string()),
            );
        }
    }
}

fn extract_entry(
    entry: &ArchivedEntry,
    normalized: &str,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
) -> Result<()> {
    let target = path_safety::resolve_within_cwd(&opts.cwd, normalized)?;
    match &entry.body {
        ArchivedBody::File { .. } => unreachable!("file bodies go through materialize_or_skip_file_body"),
        ArchivedBody::Symlink(symlink) => extract_symlink(entry, symlink, &target, opts),
        ArchivedBody::EmptyDir => extract_empty_dir(entry, &target, opts, host),
    }
}

fn extract_symlink(
    _entry: &ArchivedEntry,
    symlink: &SymlinkTarget,
    target: &Path,
    opts: &ReadOptions,
) -> Result<()> {
    let dest = symlink
        .preferred()
        .ok_or_else(|| ArchiverError::InvalidFile("symlink has no usable target".to_string()))?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(ArchiverError::from)?;
        apply_dir_permissions(parent, opts);
    }

    if target.symlink_metadata().is_ok() {
        if !opts.overwrite_extract {
            notify::warn(&format!("skipping existing symlink {}", target.display()));
            return Ok(());
        }
        let _ = fs::remove_file(target);
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(dest, target).map_err(ArchiverError::FailedToExtractSymlink)?;
    }
    #[cfg(not(unix))]
    {
        return Err(ArchiverError::FailedToExtractSymlink(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlinks are only supported on unix targets",
        )));
    }
    Ok(())
}

fn extract_empty_dir(
    entry: &ArchivedEntry,
    target: &Path,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
) -> Result<()> {
    let mode = opts.empty_dir_permissions.unwrap_or_else(|| entry.permissions.mode());
    fs::create_dir_all(target).map_err(ArchiverError::from)?;
    apply_mode(target, mode);
    if opts.is_root {
        let uid = opts.user_map.resolve(entry.uid, entry.uname.as_deref(), opts.prefer, host);
        let gid = opts.group_map.resolve(entry.gid, entry.gname.as_deref(), opts.prefer, host);
        apply_chown(target, uid, gid);
    }
    Ok(())
}

fn apply_dir_permissions(dir: &Path, opts: &ReadOptions) {
    if let Some(mode) = opts.dir_permissions {
        apply_mode(dir, mode);
    }
}

fn apply_file_permissions(
    target: &Path,
    entry: &ArchivedEntry,
    opts: &ReadOptions,
    host: &dyn HostIdentityLookup,
) {
    let mode = opts.file_permissions.unwrap_or_else(|| entry.permissions.mode());
    apply_mode(target, mode);
    if opts.is_root {
        let uid = opts.user_map.resolve(entry.uid, entry.uname.as_deref(), opts.prefer, host);
        let gid = opts.group_map.resolve(entry.gid, entry.gname.as_deref(), opts.prefer, host);
        apply_chown(target, uid, gid);
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        notify::warn(&format!("failed to set permissions on {}: {e}", path.display()));
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) {}

#[cfg(unix)]
fn apply_chown(path: &Path, uid: u32, gid: u32) {
    use nix::unistd::{chown, Gid, Uid};
    if let Err(e) = chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))) {
        notify::warn(&format!("failed to set owner on {}: {e}", path.display()));
    }
}

#[cfg(not(unix))]
fn apply_chown(_path: &Path, _uid: u32, _gid: u32) {}
