//! `sarc` — command-line front end for the `simple_archiver` library.
//!
//! Owns everything the library deliberately does not: argument parsing,
//! filesystem enumeration, host identity lookups, and exit-code mapping
//! (§1, "external collaborators"; §6.2 CLI surface).

mod cli;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use simple_archiver::entry::{EntryKind, EntrySource};
use simple_archiver::error::exit_code_for;
use simple_archiver::identity::{IdentityMap, PreferDimension};
use simple_archiver::notify;
use simple_archiver::path_safety::join_and_normalize;
use simple_archiver::selector::Selector;
use simple_archiver::writer::{PreparedEntry, SortOrder, WriteOptions};
use simple_archiver::{create_archive, read_archive, ArchiverError, ReadMode, ReadOptions};

use cli::args::{parse_chunk_size, Cli};
use cli::enumerate::enumerate;
use cli::host_identity::NixHostIdentity;

const STDIO_MARK: &str = "-";

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        0
    } else {
        2 + cli.verbose as i32
    };
    notify::set_notification_level(level);

    let mode_count = cli.create as u8 + cli.extract as u8 + cli.examine as u8;
    if mode_count != 1 {
        eprintln!("sarc: exactly one of -c/-x/-t must be given");
        return ExitCode::from(9);
    }
    if cli.file.is_empty() {
        eprintln!("sarc: -f/--file is required");
        return ExitCode::from(6);
    }

    let result = if cli.create {
        run_create(&cli)
    } else if cli.extract {
        run_read(&cli, ReadMode::Extract)
    } else {
        run_read(&cli, ReadMode::Examine)
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("sarc: {err}");
            ExitCode::from(exit_code_for(&err) as u8)
        }
    }
}

fn build_selector(cli: &Cli) -> Selector {
    let mut selector = Selector::new();
    selector.whitelist.contains_any.values = cli.whitelist_contains_any.clone();
    selector.whitelist.contains_all.values = cli.whitelist_contains_all.clone();
    selector.whitelist.begins_with.values = cli.whitelist_begins_with.clone();
    selector.whitelist.ends_with.values = cli.whitelist_ends_with.clone();
    selector.blacklist.contains_any.values = cli.blacklist_contains_any.clone();
    selector.blacklist.contains_all.values = cli.blacklist_contains_all.clone();
    selector.blacklist.begins_with.values = cli.blacklist_begins_with.clone();
    selector.blacklist.ends_with.values = cli.blacklist_ends_with.clone();
    selector.case_insensitive = cli.wb_case_insensitive;
    for ext in &cli.add_file_ext {
        selector.add_do_not_compress_ext(ext);
    }
    if cli.use_file_exts_preset {
        for ext in COMPRESSED_EXTENSION_PRESET {
            selector.add_do_not_compress_ext(ext);
        }
    }
    selector
}

/// Extensions of formats that are already compressed and gain nothing (or
/// lose) from a second compression pass.
const COMPRESSED_EXTENSION_PRESET: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".zip", ".gz", ".bz2", ".xz", ".zst", ".mp3",
    ".mp4", ".mkv", ".7z",
];

fn build_identity_maps(cli: &Cli) -> io::Result<(IdentityMap, IdentityMap)> {
    let mut user_map = IdentityMap::for_users();
    let mut group_map = IdentityMap::for_groups();
    for (from, to) in &cli.map_user {
        user_map
            .add_name_to_name(from, to)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    }
    for (from, to) in &cli.map_group {
        group_map
            .add_name_to_name(from, to)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    }
    Ok((user_map, group_map))
}

fn open_output(cli: &Cli) -> Result<Box<dyn Write>, ArchiverError> {
    if cli.file == STDIO_MARK {
        return Ok(Box::new(io::stdout()));
    }
    let path = PathBuf::from(&cli.file);
    if path.exists() && !cli.overwrite_create {
        return Err(ArchiverError::OverwriteRefused(format!(
            "archive {} already exists; pass --overwrite-create to replace it",
            path.display()
        )));
    }
    File::create(&path)
        .map(|f| Box::new(f) as Box<dyn Write>)
        .map_err(ArchiverError::FailedToOpenForWrite)
}

fn open_input(cli: &Cli) -> Result<Box<dyn Read>, ArchiverError> {
    if cli.file == STDIO_MARK {
        if io::stdin().is_terminal() {
            return Err(ArchiverError::InvalidFile(
                "refusing to read an archive from a console".to_string(),
            ));
        }
        return Ok(Box::new(io::stdin()));
    }
    File::open(&cli.file)
        .map(|f| Box::new(f) as Box<dyn Read>)
        .map_err(|e| ArchiverError::InvalidFile(e.to_string()))
}

fn run_create(cli: &Cli) -> Result<i32, ArchiverError> {
    if cli.inputs.is_empty() {
        return Err(ArchiverError::InvalidParsedState(
            "no input paths given to archive".to_string(),
        ));
    }

    let host = NixHostIdentity;
    let selector = build_selector(cli);
    let (user_map, group_map) = build_identity_maps(cli).map_err(ArchiverError::from)?;

    let preserve_empty_dirs = !cli.no_preserve_empty_dirs;
    let sources = enumerate(&cli.inputs, cli.recursive, preserve_empty_dirs, &host)
        .map_err(ArchiverError::from)?;

    let mut prepared = Vec::with_capacity(sources.len());
    for source in sources {
        if !selector.accepts(source.path()) {
            continue;
        }
        let path = source.path().to_string();
        let (uid, gid, uname, gname) =
            resolve_write_identity(cli, source.as_ref(), &user_map, &group_map, &host);
        let do_not_compress = selector.is_do_not_compress(&path);
        prepared.push(PreparedEntry::new(
            source,
            path,
            uid,
            gid,
            uname,
            gname,
            do_not_compress,
        ));
    }

    if cli.no_abs_symlink {
        for entry in &mut prepared {
            entry.symlink_target.prefer_absolute = false;
        }
    }

    let safe_links = !(cli.preserve_symlinks || cli.no_safe_links);
    if safe_links {
        apply_safe_links(&mut prepared);
    }

    let sort_order = if cli.sort_files_by_name {
        SortOrder::NameAscending
    } else if cli.no_pre_sort_files {
        SortOrder::AsEnumerated
    } else {
        SortOrder::SizeDescending
    };

    let chunk_min_size = match &cli.chunk_min_size {
        Some(s) => parse_chunk_size(s).map_err(ArchiverError::InvalidParsedState)?,
        None => simple_archiver::config::DEFAULT_CHUNK_MIN_SIZE,
    };

    let opts = WriteOptions {
        version: cli.write_version,
        compressor: cli.compressor.clone(),
        decompressor: cli.decompressor.clone(),
        chunk_min_size,
        prefix: cli.prefix.clone(),
        temp_dir: cli.temp_files_dir.clone(),
        force_tmpfile: cli.force_tmpfile,
        sort_order,
    };

    let mut out = open_output(cli)?;
    let result = create_archive(&mut out, prepared, &opts);
    if result.is_err() && cli.file != STDIO_MARK {
        let _ = fs::remove_file(&cli.file);
    }
    result?;
    Ok(0)
}

fn resolve_write_identity(
    cli: &Cli,
    source: &dyn EntrySource,
    user_map: &IdentityMap,
    group_map: &IdentityMap,
    host: &NixHostIdentity,
) -> (u32, u32, Option<String>, Option<String>) {
    let mut uid = source.uid();
    let mut gid = source.gid();
    let mut uname = source.uname().map(str::to_string);
    let mut gname = source.gname().map(str::to_string);

    if let Some(name) = &uname {
        if let Some(resolved) = user_map.resolve_by_name(name, host) {
            uid = resolved;
        }
    } else {
        uid = user_map.resolve_id(uid, host);
    }
    if let Some(name) = &gname {
        if let Some(resolved) = group_map.resolve_by_name(name, host) {
            gid = resolved;
        }
    } else {
        gid = group_map.resolve_id(gid, host);
    }

    if let Some(forced) = cli.force_uid {
        uid = forced;
    }
    if let Some(forced) = cli.force_gid {
        gid = forced;
    }
    if let Some(forced) = &cli.force_user {
        uname = Some(forced.clone());
    }
    if let Some(forced) = &cli.force_group {
        gname = Some(forced.clone());
    }

    (uid, gid, uname, gname)
}

/// Drops any symlink whose resolved target is not itself an archived entry
/// (§4.3 safe-links enforcement, default on).
fn apply_safe_links(prepared: &mut Vec<PreparedEntry>) {
    let archived: HashSet<String> = prepared.iter().map(|e| e.path.clone()).collect();
    let mut dropped = Vec::new();
    prepared.retain(|entry| {
        if entry.kind != EntryKind::Symlink {
            return true;
        }
        let resolved = resolved_link_target(entry);
        let safe = resolved.map(|r| archived.contains(&r)).unwrap_or(false);
        if !safe {
            dropped.push(entry.path.clone());
        }
        safe
    });
    for path in dropped {
        notify::warn(&format!("dropping unsafe symlink {path}: target is not archived"));
    }
}

/// Normalizes a symlink's recorded target to the same `/`-free path form
/// used for archived entry paths, so it can be looked up in the archived set.
fn resolved_link_target(entry: &PreparedEntry) -> Option<String> {
    if let Some(rel) = &entry.symlink_target.rel {
        let link_dir = entry.path.rfind('/').map(|i| &entry.path[..i]).unwrap_or("");
        return Some(join_and_normalize(link_dir, rel));
    }
    entry
        .symlink_target
        .abs
        .as_ref()
        .map(|abs| abs.trim_start_matches('/').to_string())
}

fn run_read(cli: &Cli, mode: ReadMode) -> Result<i32, ArchiverError> {
    let host = NixHostIdentity;
    let selector = build_selector(cli);
    let (user_map, group_map) = build_identity_maps(cli).map_err(ArchiverError::from)?;

    let cwd = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    if mode == ReadMode::Extract {
        fs::create_dir_all(&cwd).map_err(ArchiverError::FailedToChangeCwd)?;
    }

    let prefer = if cli.extract_prefer_uid || cli.extract_prefer_gid {
        PreferDimension::Id
    } else {
        PreferDimension::Name
    };

    let opts = ReadOptions {
        mode,
        cwd,
        decompressor_override: cli.decompressor.clone(),
        selector,
        allow_double_dot: cli.allow_double_dot,
        overwrite_extract: cli.overwrite_extract,
        user_map,
        group_map,
        prefer,
        dir_permissions: cli.force_dir_permissions,
        file_permissions: cli.force_file_permissions,
        empty_dir_permissions: cli.force_empty_dir_permissions,
        is_root: is_effective_root(),
    };

    let mut input = open_input(cli)?;
    let summary = read_archive(&mut input, &opts, &host)?;
    notify::display_level(
        2,
        &format!(
            "{} entries seen, {} materialized\n",
            summary.entries_seen, summary.entries_materialized
        ),
    );
    Ok(0)
}

#[cfg(unix)]
fn is_effective_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_effective_root() -> bool {
    false
}
