//! Concrete end-to-end scenarios exercising the library's public API
//! directly: build an archive in memory, read it back, check the result.

mod common;

use std::fs;
use std::io::Cursor;

use tempfile::TempDir;

use simple_archiver::identity::IdentityMap;
use simple_archiver::selector::Selector;
use simple_archiver::writer::SortOrder;
use simple_archiver::{create_archive, read_archive, ArchiverError, ReadMode, ReadOptions, WriteOptions};

use common::{do_not_compress_file, empty_dir, file, file_owned, relative_symlink, NullHost};

fn extract(archive: Vec<u8>, dir: &TempDir, selector: Selector) -> simple_archiver::ReadSummary {
    let opts = ReadOptions {
        mode: ReadMode::Extract,
        cwd: dir.path().to_path_buf(),
        selector,
        ..ReadOptions::default()
    };
    let mut cursor = Cursor::new(archive);
    read_archive(&mut cursor, &opts, &NullHost).unwrap()
}

#[test]
fn v0_single_file_is_bit_exact_after_roundtrip() {
    let entry = file("greeting.txt", b"hello, world", 0o644);
    let opts = WriteOptions {
        version: 0,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![entry], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 1);
    assert_eq!(fs::read(dir.path().join("greeting.txt")).unwrap(), b"hello, world");
}

#[test]
fn examine_mode_reports_entries_without_writing_anything() {
    let a = file("a.txt", b"aaa", 0o644);
    let b = file("b.txt", b"bbb", 0o644);
    let opts = WriteOptions {
        version: 0,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![a, b], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let read_opts = ReadOptions {
        mode: ReadMode::Examine,
        cwd: dir.path().to_path_buf(),
        ..ReadOptions::default()
    };
    let mut cursor = Cursor::new(archive);
    let summary = read_archive(&mut cursor, &read_opts, &NullHost).unwrap();
    assert_eq!(summary.entries_seen, 2);
    assert_eq!(summary.entries_materialized, 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn v1_chunked_archive_roundtrips_through_cat() {
    let a = file("one", b"first file contents", 0o644);
    let b = file("two", b"second file contents", 0o644);
    let opts = WriteOptions {
        version: 1,
        compressor: Some("cat".to_string()),
        decompressor: Some("cat".to_string()),
        chunk_min_size: 1,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![a, b], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 2);
    assert_eq!(fs::read(dir.path().join("one")).unwrap(), b"first file contents");
    assert_eq!(fs::read(dir.path().join("two")).unwrap(), b"second file contents");
}

#[test]
fn do_not_compress_extension_is_stored_raw_even_with_a_compressor() {
    let image = do_not_compress_file("photo.png", b"\x89PNG-fake-bytes", 0o644);
    let opts = WriteOptions {
        version: 5,
        compressor: Some("cat".to_string()),
        decompressor: Some("cat".to_string()),
        chunk_min_size: 1,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![image], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 1);
    assert_eq!(fs::read(dir.path().join("photo.png")).unwrap(), b"\x89PNG-fake-bytes");
}

#[test]
fn relative_symlink_roundtrips() {
    let target = file("real/data.txt", b"payload", 0o644);
    let link = relative_symlink("alias.txt", "real/data.txt");
    let opts = WriteOptions {
        version: 1,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![target, link], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 2);
    let resolved = fs::read_link(dir.path().join("alias.txt")).unwrap();
    assert_eq!(resolved, std::path::PathBuf::from("real/data.txt"));
}

#[test]
fn empty_directory_is_preserved_from_v2_onward() {
    let dir_entry = empty_dir("scratch");
    let opts = WriteOptions {
        version: 2,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![dir_entry], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 1);
    assert!(dir.path().join("scratch").is_dir());
}

#[test]
fn v0_drops_empty_directories() {
    let dir_entry = empty_dir("scratch");
    let opts = WriteOptions {
        version: 0,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![dir_entry], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 0);
    assert!(!dir.path().join("scratch").exists());
}

#[test]
fn uname_gname_survive_v3_and_later_with_identity_remap() {
    let entry = file_owned("owned.txt", b"stuff", 0o644, 1000, 1000, "alice", "staff");
    let opts = WriteOptions {
        version: 3,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![entry], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let mut user_map = IdentityMap::for_users();
    user_map.add_name_to_name("alice", "bob").unwrap();
    let read_opts = ReadOptions {
        mode: ReadMode::Extract,
        cwd: dir.path().to_path_buf(),
        user_map,
        ..ReadOptions::default()
    };
    let mut cursor = Cursor::new(archive);
    let summary = read_archive(&mut cursor, &read_opts, &NullHost).unwrap();
    assert_eq!(summary.entries_materialized, 1);
    assert!(dir.path().join("owned.txt").exists());
}

#[test]
fn v4_stored_prefix_is_stripped_on_extraction() {
    let entry = file("notes.txt", b"content", 0o644);
    let opts = WriteOptions {
        version: 4,
        prefix: Some("backup-2026".to_string()),
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![entry], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let summary = extract(archive, &dir, Selector::new());
    assert_eq!(summary.entries_materialized, 1);
    assert!(dir.path().join("notes.txt").exists());
    assert!(!dir.path().join("backup-2026").exists());
}

#[test]
fn blacklisted_entries_are_skipped_on_extract() {
    let keep = file("keep.txt", b"keep", 0o644);
    let skip = file("node_modules/skip.txt", b"skip", 0o644);
    let opts = WriteOptions {
        version: 0,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, vec![keep, skip], &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let mut selector = Selector::new();
    selector.blacklist.contains_any.values.push("node_modules".to_string());
    let summary = extract(archive, &dir, selector);
    assert_eq!(summary.entries_materialized, 1);
    assert!(dir.path().join("keep.txt").exists());
    assert!(!dir.path().join("node_modules").exists());
}

#[test]
fn reading_an_archive_missing_its_magic_fails_with_invalid_file() {
    let mut cursor = Cursor::new(b"not an archive at all, just text".to_vec());
    let opts = ReadOptions::default();
    let err = read_archive(&mut cursor, &opts, &NullHost).unwrap_err();
    assert!(matches!(err, ArchiverError::InvalidFile(_)));
}
