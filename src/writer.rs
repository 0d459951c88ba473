//! Archive writer: header, per-version body, chunking, streaming through the
//! compressor (§4.6).
//!
//! The six format versions share a single parameterized entry/chunk codec
//! (`FormatTraits`) rather than six near-duplicate functions (§9 design
//! note), mirroring how the teacher's `io/compress_frame.rs` and
//! `io/compress_legacy.rs` share child-process plumbing while differing only
//! in framing.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::codec::{self, Flags4};
use crate::config::{DEFAULT_CHUNK_MIN_SIZE, MAGIC, MAX_WRITE_VERSION};
use crate::entry::{EntryKind, EntrySource, Permissions, SymlinkTarget};
use crate::error::{ArchiverError, Result};
use crate::format::{ChunkSizeFields, FormatTraits};
use crate::notify;
use crate::pipe_child::{is_cancelled, ChildDirection, ChildRunner};

/// Byte position, within a per-file `Flags4` block, of the v5 "stored raw"
/// bit. Placed at the next reserved bit after "prefer absolute" (byte1 bit2).
const FILE_RAW_BIT: (usize, u8) = (1, 3);

/// How files are ordered before chunking (§5 ordering guarantees: the
/// writer may sort by size descending or by name ascending if requested).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    AsEnumerated,
    SizeDescending,
    NameAscending,
}

pub struct WriteOptions {
    pub version: u16,
    pub compressor: Option<String>,
    pub decompressor: Option<String>,
    pub chunk_min_size: u64,
    pub prefix: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub force_tmpfile: bool,
    pub sort_order: SortOrder,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            version: MAX_WRITE_VERSION,
            compressor: None,
            decompressor: None,
            chunk_min_size: DEFAULT_CHUNK_MIN_SIZE,
            prefix: None,
            temp_dir: None,
            force_tmpfile: false,
            sort_order: SortOrder::SizeDescending,
        }
    }
}

/// One entry fully resolved for writing: path already has any prefix logic
/// pending (applied at encode time), identity already remapped, and
/// do-not-compress status already decided by the selector. Wraps the
/// caller-supplied [`EntrySource`] rather than copying its content.
pub struct PreparedEntry {
    pub path: String,
    pub kind: EntryKind,
    pub permissions: Permissions,
    pub uid: u32,
    pub gid: u32,
    pub uname: Option<String>,
    pub gname: Option<String>,
    pub file_len: u64,
    pub do_not_compress: bool,
    pub symlink_target: SymlinkTarget,
    source: Box<dyn EntrySource>,
}

impl PreparedEntry {
    pub fn new(
        source: Box<dyn EntrySource>,
        path: String,
        uid: u32,
        gid: u32,
        uname: Option<String>,
        gname: Option<String>,
        do_not_compress: bool,
    ) -> Self {
        let kind = source.kind();
        let permissions = source.permissions();
        let file_len = source.file_len();
        let symlink_target = source.symlink_target();
        PreparedEntry {
            path,
            kind,
            permissions,
            uid,
            gid,
            uname,
            gname,
            file_len,
            do_not_compress,
            symlink_target,
            source,
        }
    }

    fn open_reader(&self) -> std::io::Result<Box<dyn Read + Send>> {
        self.source.open_reader()
    }
}

pub struct WriteSummary {
    pub entries_written: usize,
}

/// Writes a complete archive to `out` from `entries`, which must already have
/// passed path validation, selection, safe-link filtering, and identity
/// remapping (the caller's job, per §3 "write state").
pub fn create_archive(
    out: &mut dyn Write,
    mut entries: Vec<PreparedEntry>,
    opts: &WriteOptions,
) -> Result<WriteSummary> {
    let traits = FormatTraits::for_version(opts.version)?;
    sort_entries(&mut entries, opts.sort_order);

    out.write_all(MAGIC).map_err(ArchiverError::FailedToWrite)?;
    codec::write_u16(out, traits.version)?;

    if traits.has_prefix {
        codec::write_str(out, opts.prefix.as_deref().unwrap_or(""))?;
    }

    let mut header_flags = Flags4::zero();
    header_flags.set(0, 0, opts.compressor.is_some());
    header_flags.write(out)?;
    if opts.compressor.is_some() {
        codec::write_str(out, opts.compressor.as_deref().unwrap_or(""))?;
        codec::write_str(out, opts.decompressor.as_deref().unwrap_or(""))?;
    }

    let total = entries.len() as u64;
    let mut written = 0u64;

    if !traits.has_chunking {
        write_v0_body(out, &entries, opts, &mut written, total)?;
        notify::finish_progress();
        return Ok(WriteSummary {
            entries_written: written as usize,
        });
    }

    write_links_section(out, &entries, &traits, &mut written, total)?;
    if traits.has_empty_dir_section {
        write_dirs_section(out, &entries, &traits, &mut written, total)?;
    }
    write_chunks_section(out, &entries, &traits, opts, &mut written, total)?;

    notify::finish_progress();
    Ok(WriteSummary {
        entries_written: written as usize,
    })
}

fn sort_entries(entries: &mut [PreparedEntry], order: SortOrder) {
    match order {
        SortOrder::AsEnumerated => {}
        SortOrder::SizeDescending => entries.sort_by(|a, b| b.file_len.cmp(&a.file_len)),
        SortOrder::NameAscending => entries.sort_by(|a, b| a.path.cmp(&b.path)),
    }
}

fn encoded_name(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}{path}"),
        _ => path.to_string(),
    }
}

fn tick(total: u64, written: &mut u64) {
    *written += 1;
    notify::report_progress(*written, total);
}

// ---------------------------------------------------------------------
// v0: flat per-entry list, no chunking, no empty directories.
// ---------------------------------------------------------------------

fn write_v0_body(
    out: &mut dyn Write,
    entries: &[PreparedEntry],
    opts: &WriteOptions,
    written: &mut u64,
    total: u64,
) -> Result<()> {
    let files_and_links: Vec<&PreparedEntry> = entries
        .iter()
        .filter(|e| e.kind != EntryKind::EmptyDir)
        .collect();
    if entries.iter().any(|e| e.kind == EntryKind::EmptyDir) {
        notify::warn("archive format v0 does not support empty directories; dropping");
    }

    codec::write_u32(out, files_and_links.len() as u32)?;

    for entry in files_and_links {
        if is_cancelled() {
            return Err(ArchiverError::SigInt);
        }
        codec::write_str(out, &entry.path)?;

        let mut flags = Flags4::zero();
        flags.set(0, 0, entry.kind == EntryKind::Symlink);
        entry.permissions.write_into_flags4(&mut flags);

        match entry.kind {
            EntryKind::File => {
                flags.write(out)?;
                write_v0_file_body(out, entry, opts)?;
            }
            EntryKind::Symlink => {
                let target = &entry.symlink_target;
                if target.abs.is_none() && target.rel.is_none() {
                    return Err(ArchiverError::InvalidParsedState(format!(
                        "symlink {} has neither absolute nor relative target",
                        entry.path
                    )));
                }
                flags.set(FILE_RAW_BIT.0, FILE_RAW_BIT.1, false);
                flags.set(1, 2, target.prefer_absolute);
                flags.write(out)?;
                codec::write_opt_str(out, target.abs.as_deref())?;
                codec::write_opt_str(out, target.rel.as_deref())?;
            }
            EntryKind::EmptyDir => unreachable!("filtered out above"),
        }
        tick(total, written);
    }
    Ok(())
}

/// Writes one v0 file body: `u64 length` followed by that many bytes.
///
/// When a compressor is configured (§4.6 v0 body, point 4: "Compressed-file
/// bodies are produced by compressing the file to a temp file, taking its
/// length, emitting the header with that length, then streaming the temp
/// file"), every file is compressed — v0's header flag is archive-wide, with
/// no per-file raw bit to fall back on, so `do_not_compress` cannot be honored
/// here the way it is for v1+ chunks.
fn write_v0_file_body(out: &mut dyn Write, entry: &PreparedEntry, opts: &WriteOptions) -> Result<()> {
    let mut reader = entry.open_reader().map_err(|e| {
        notify::warn(&format!("skipping {}: {e}", entry.path));
        ArchiverError::from(e)
    })?;

    match opts.compressor.as_deref() {
        None => {
            codec::write_u64(out, entry.file_len)?;
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = reader.read(&mut buf).map_err(ArchiverError::from)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n]).map_err(ArchiverError::FailedToWrite)?;
            }
            Ok(())
        }
        Some(compressor) => {
            if entry.do_not_compress {
                notify::warn(&format!(
                    "{}: do-not-compress has no effect in format v0; compressing anyway",
                    entry.path
                ));
            }
            let mut staging = TempStaging::create(opts.temp_dir.as_deref(), opts.force_tmpfile)?;
            {
                let staging_file = staging.as_file_mut();
                let mut runner = ChildRunner::spawn(compressor, ChildDirection::Compress)?;
                runner.transfer(&mut reader, staging_file)?;
            }
            let compressed_size = staging.len()?;
            staging.rewind()?;
            codec::write_u64(out, compressed_size)?;
            std::io::copy(staging.as_file_mut(), out).map_err(ArchiverError::FailedToWrite)?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------
// v1-v5: link section, optional dir section, chunked file section.
// ---------------------------------------------------------------------

fn write_links_section(
    out: &mut dyn Write,
    entries: &[PreparedEntry],
    traits: &FormatTraits,
    written: &mut u64,
    total: u64,
) -> Result<()> {
    let links: Vec<&PreparedEntry> = entries.iter().filter(|e| e.kind == EntryKind::Symlink).collect();
    codec::write_u32(out, links.len() as u32)?;
    for link in links {
        let target = &link.symlink_target;
        if target.abs.is_none() && target.rel.is_none() {
            return Err(ArchiverError::InvalidParsedState(format!(
                "symlink {} has neither absolute nor relative target",
                link.path
            )));
        }
        let mut link_flags: u16 = 0;
        if target.prefer_absolute {
            link_flags |= 1;
        }
        codec::write_u16(out, link_flags)?;
        codec::write_str(out, &link.path)?;
        codec::write_opt_str(out, target.abs.as_deref())?;
        codec::write_opt_str(out, target.rel.as_deref())?;
        if traits.has_uname_gname {
            codec::write_str(out, link.uname.as_deref().unwrap_or(""))?;
            codec::write_str(out, link.gname.as_deref().unwrap_or(""))?;
        }
        tick(total, written);
    }
    Ok(())
}

fn write_dirs_section(
    out: &mut dyn Write,
    entries: &[PreparedEntry],
    traits: &FormatTraits,
    written: &mut u64,
    total: u64,
) -> Result<()> {
    let dirs: Vec<&PreparedEntry> = entries.iter().filter(|e| e.kind == EntryKind::EmptyDir).collect();
    codec::write_u32(out, dirs.len() as u32)?;
    for dir in dirs {
        codec::write_u16(out, 0)?; // dir_flags reserved
        codec::write_str(out, &dir.path)?;
        let mut flags = Flags4::zero();
        dir.permissions.write_into_flags4(&mut flags);
        flags.write(out)?;
        if traits.has_uname_gname {
            codec::write_str(out, dir.uname.as_deref().unwrap_or(""))?;
            codec::write_str(out, dir.gname.as_deref().unwrap_or(""))?;
        }
        tick(total, written);
    }
    Ok(())
}

fn write_chunks_section(
    out: &mut dyn Write,
    entries: &[PreparedEntry],
    traits: &FormatTraits,
    opts: &WriteOptions,
    written: &mut u64,
    total: u64,
) -> Result<()> {
    let files: Vec<&PreparedEntry> = entries.iter().filter(|e| e.kind == EntryKind::File).collect();
    let chunks = group_into_chunks(&files, opts.chunk_min_size);

    codec::write_u32(out, chunks.len() as u32)?;
    for chunk in &chunks {
        write_one_chunk(out, chunk, traits, opts, written, total)?;
    }
    Ok(())
}

/// Greedy chunk accumulation per §4.6: accumulate until the running
/// uncompressed size reaches the minimum, flush a do-not-compress entry as
/// its own singleton chunk immediately, and flush whatever remains at the
/// end even if under threshold.
fn group_into_chunks<'a>(files: &[&'a PreparedEntry], min_size: u64) -> Vec<Vec<&'a PreparedEntry>> {
    let mut chunks = Vec::new();
    let mut current: Vec<&PreparedEntry> = Vec::new();
    let mut current_size: u64 = 0;

    for &file in files {
        if file.do_not_compress {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_size = 0;
            }
            chunks.push(vec![file]);
            continue;
        }
        current.push(file);
        current_size += file.file_len;
        if current_size >= min_size {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn write_one_chunk(
    out: &mut dyn Write,
    chunk: &[&PreparedEntry],
    traits: &FormatTraits,
    opts: &WriteOptions,
    written: &mut u64,
    total: u64,
) -> Result<()> {
    let raw = opts.compressor.is_none() || (chunk.len() == 1 && chunk[0].do_not_compress);

    codec::write_u16(out, chunk.len() as u16)?;
    let mut uncompressed_size: u64 = 0;
    for file in chunk {
        let mut flags = Flags4::zero();
        file.permissions.write_into_flags4(&mut flags);
        if traits.has_per_file_raw_bit {
            flags.set(FILE_RAW_BIT.0, FILE_RAW_BIT.1, raw);
        }
        codec::write_str(out, &file.path)?;
        flags.write(out)?;
        codec::write_u32(out, file.uid)?;
        codec::write_u32(out, file.gid)?;
        if traits.has_uname_gname {
            codec::write_str(out, file.uname.as_deref().unwrap_or(""))?;
            codec::write_str(out, file.gname.as_deref().unwrap_or(""))?;
        }
        codec::write_u64(out, file.file_len)?;
        uncompressed_size += file.file_len;
    }

    let mut staging = TempStaging::create(opts.temp_dir.as_deref(), opts.force_tmpfile)?;
    {
        let staging_file = staging.as_file_mut();
        if raw {
            for file in chunk {
                stream_file_into(file, staging_file)?;
            }
        } else {
            let compressor = opts
                .compressor
                .as_deref()
                .ok_or(ArchiverError::NoCompressor)?;
            let mut runner = ChildRunner::spawn(compressor, ChildDirection::Compress)?;
            let mut reader = ChunkReader::new(chunk);
            runner.transfer(&mut reader, staging_file)?;
        }
    }
    let compressed_size = staging.len()?;
    staging.rewind()?;

    match traits.chunk_size_fields {
        ChunkSizeFields::CompressedOnly => codec::write_u64(out, compressed_size)?,
        ChunkSizeFields::UncompressedAndCompressed => {
            codec::write_u64(out, uncompressed_size)?;
            codec::write_u64(out, compressed_size)?;
        }
    }

    std::io::copy(staging.as_file_mut(), out).map_err(ArchiverError::FailedToWrite)?;
    for _ in chunk {
        tick(total, written);
    }
    Ok(())
}

fn stream_file_into(file: &PreparedEntry, out: &mut std::fs::File) -> Result<()> {
    let mut reader = file.open_reader().map_err(ArchiverError::from)?;
    std::io::copy(&mut reader, out).map_err(ArchiverError::FailedToWrite)?;
    Ok(())
}

/// Concatenates a chunk's file bodies into one `Read` stream, in order, for
/// feeding to the compressor in a single pass (§4.6 "stream every file body
/// through it").
struct ChunkReader<'a> {
    files: std::slice::Iter<'a, &'a PreparedEntry>,
    current: Option<Box<dyn Read + Send>>,
}

impl<'a> ChunkReader<'a> {
    fn new(files: &'a [&'a PreparedEntry]) -> Self {
        ChunkReader {
            files: files.iter(),
            current: None,
        }
    }
}

impl<'a> Read for ChunkReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if let Some(r) = self.current.as_mut() {
                let n = r.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                self.current = None;
            }
            match self.files.next() {
                Some(file) => {
                    self.current = Some(file.open_reader()?);
                }
                None => return Ok(0),
            }
        }
    }
}

/// Staging area for a chunk's (or v0 file's) compressed bytes: either a
/// named temp file in the configured directory, or (under `--force-tmpfile`)
/// an anonymous, already-unlinked temp file. Cleaned up on drop either way.
enum TempStaging {
    Named(NamedTempFile),
    Anonymous(std::fs::File),
}

impl TempStaging {
    fn create(dir: Option<&Path>, force_tmpfile: bool) -> Result<Self> {
        let staging = if force_tmpfile {
            let f = match dir {
                Some(d) => tempfile::tempfile_in(d),
                None => tempfile::tempfile(),
            }
            .map_err(|_| ArchiverError::TooManyDirs)?;
            TempStaging::Anonymous(f)
        } else {
            let f = match dir {
                Some(d) => NamedTempFile::new_in(d),
                None => NamedTempFile::new(),
            }
            .map_err(|_| ArchiverError::TooManyDirs)?;
            TempStaging::Named(f)
        };
        staging.set_owner_only_permissions()?;
        Ok(staging)
    }

    #[cfg(unix)]
    fn set_owner_only_permissions(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let file = match self {
            TempStaging::Named(f) => f.as_file(),
            TempStaging::Anonymous(f) => f,
        };
        file.set_permissions(std::fs::Permissions::from_mode(crate::config::TEMP_FILE_MODE))
            .map_err(ArchiverError::from)
    }

    #[cfg(not(unix))]
    fn set_owner_only_permissions(&self) -> Result<()> {
        Ok(())
    }

    fn as_file_mut(&mut self) -> &mut std::fs::File {
        match self {
            TempStaging::Named(f) => f.as_file_mut(),
            TempStaging::Anonymous(f) => f,
        }
    }

    fn len(&mut self) -> Result<u64> {
        self.as_file_mut()
            .seek(SeekFrom::Current(0))
            .map_err(ArchiverError::from)
    }

    fn rewind(&mut self) -> Result<()> {
        self.as_file_mut()
            .seek(SeekFrom::Start(0))
            .map(|_| ())
            .map_err(ArchiverError::from)
    }
}
