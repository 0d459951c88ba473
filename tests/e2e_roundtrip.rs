//! Broader roundtrip coverage across format versions and chunking
//! configurations, independent of the scenario-table tests.

mod common;

use std::fs;
use std::io::Cursor;

use tempfile::TempDir;

use simple_archiver::writer::SortOrder;
use simple_archiver::{create_archive, read_archive, ReadMode, ReadOptions, WriteOptions};

use common::{empty_dir, file, relative_symlink, NullHost};

fn roundtrip(version: u16, entries: Vec<simple_archiver::PreparedEntry>, chunk_min_size: u64) -> TempDir {
    let opts = WriteOptions {
        version,
        chunk_min_size,
        sort_order: SortOrder::AsEnumerated,
        ..WriteOptions::default()
    };
    let mut archive = Vec::new();
    create_archive(&mut archive, entries, &opts).unwrap();

    let dir = TempDir::new().unwrap();
    let read_opts = ReadOptions {
        mode: ReadMode::Extract,
        cwd: dir.path().to_path_buf(),
        ..ReadOptions::default()
    };
    let mut cursor = Cursor::new(archive);
    read_archive(&mut cursor, &read_opts, &NullHost).unwrap();
    dir
}

#[test]
fn every_version_roundtrips_a_small_file_set() {
    for version in 0..=5u16 {
        let entries = vec![
            file("one.txt", b"one", 0o644),
            file("two.txt", b"two-two-two", 0o600),
            file("nested/three.txt", b"three", 0o644),
        ];
        let dir = roundtrip(version, entries, simple_archiver::config::DEFAULT_CHUNK_MIN_SIZE);
        assert_eq!(fs::read(dir.path().join("one.txt")).unwrap(), b"one");
        assert_eq!(fs::read(dir.path().join("two.txt")).unwrap(), b"two-two-two");
        assert_eq!(fs::read(dir.path().join("nested/three.txt")).unwrap(), b"three");
    }
}

#[test]
fn small_chunk_min_size_forces_many_chunks_but_content_still_matches() {
    let entries = vec![
        file("a", &[1u8; 200], 0o644),
        file("b", &[2u8; 200], 0o644),
        file("c", &[3u8; 200], 0o644),
        file("d", &[4u8; 200], 0o644),
    ];
    let dir = roundtrip(1, entries, 64);
    assert_eq!(fs::read(dir.path().join("a")).unwrap(), vec![1u8; 200]);
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), vec![2u8; 200]);
    assert_eq!(fs::read(dir.path().join("c")).unwrap(), vec![3u8; 200]);
    assert_eq!(fs::read(dir.path().join("d")).unwrap(), vec![4u8; 200]);
}

#[test]
fn large_chunk_min_size_packs_everything_into_one_chunk() {
    let entries = vec![
        file("a", b"small one", 0o644),
        file("b", b"small two", 0o644),
    ];
    let dir = roundtrip(1, entries, 1024 * 1024);
    assert_eq!(fs::read(dir.path().join("a")).unwrap(), b"small one");
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"small two");
}

#[test]
fn empty_file_roundtrips() {
    let entries = vec![file("empty.txt", b"", 0o644)];
    let dir = roundtrip(1, entries, 1024);
    assert_eq!(fs::read(dir.path().join("empty.txt")).unwrap(), b"");
}

#[test]
fn mixed_files_links_and_empty_dirs_roundtrip_together() {
    let entries = vec![
        file("data/payload.bin", b"binary-ish content", 0o644),
        relative_symlink("data/alias.bin", "payload.bin"),
        empty_dir("data/scratch"),
    ];
    let dir = roundtrip(2, entries, 1024);
    assert_eq!(fs::read(dir.path().join("data/payload.bin")).unwrap(), b"binary-ish content");
    assert!(dir.path().join("data/scratch").is_dir());
    let resolved = fs::read_link(dir.path().join("data/alias.bin")).unwrap();
    assert_eq!(resolved, std::path::PathBuf::from("payload.bin"));
}

#[test]
fn archive_creation_is_deterministic_for_the_same_inputs() {
    let build = || {
        let entries = vec![
            file("z.txt", b"zzz", 0o644),
            file("a.txt", b"aaa", 0o644),
        ];
        let opts = WriteOptions {
            version: 1,
            sort_order: SortOrder::SizeDescending,
            ..WriteOptions::default()
        };
        let mut archive = Vec::new();
        create_archive(&mut archive, entries, &opts).unwrap();
        archive
    };
    assert_eq!(build(), build());
}
