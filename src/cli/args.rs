//! Command-line surface (§6.2), parsed with `clap::Parser` the way
//! `connorhaigh-directory-archiver`'s `main.rs` parses its archiver CLI.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "sarc",
    author,
    version,
    about = "Archives filesystem entries into a single stream; compresses via an external child process"
)]
pub struct Cli {
    /// Create a new archive.
    #[arg(short = 'c', long = "create", conflicts_with_all = ["extract", "examine"])]
    pub create: bool,

    /// Extract an existing archive.
    #[arg(short = 'x', long = "extract", conflicts_with_all = ["create", "examine"])]
    pub extract: bool,

    /// List the contents of an archive without writing anything.
    #[arg(short = 't', long = "examine", conflicts_with_all = ["create", "extract"])]
    pub examine: bool,

    /// Archive file path, or `-` for stdio.
    #[arg(short = 'f', long = "file")]
    pub file: String,

    /// Working directory for extraction, or the root for creation.
    #[arg(short = 'C', long = "directory")]
    pub directory: Option<PathBuf>,

    /// Filesystem entries to archive (create mode only).
    #[arg(trailing_var_arg = true)]
    pub inputs: Vec<PathBuf>,

    /// Command line for the compressor child process, e.g. `"zstd -T0"`.
    #[arg(long = "compressor", requires = "decompressor")]
    pub compressor: Option<String>,

    /// Command line for the decompressor child process.
    #[arg(long = "decompressor", requires = "compressor")]
    pub decompressor: Option<String>,

    /// Overwrite an existing archive file on create.
    #[arg(long = "overwrite-create")]
    pub overwrite_create: bool,

    /// Overwrite existing files/symlinks on extract.
    #[arg(long = "overwrite-extract")]
    pub overwrite_extract: bool,

    /// Prefer relative symlink targets over absolute ones on extract.
    #[arg(long = "no-abs-symlink")]
    pub no_abs_symlink: bool,

    /// Disable safe-link filtering; archive every symlink as-is.
    #[arg(long = "preserve-symlinks")]
    pub preserve_symlinks: bool,

    /// Synonym for `--preserve-symlinks`, read as disabling the default.
    #[arg(long = "no-safe-links")]
    pub no_safe_links: bool,

    /// Archive format version to write, 0..=5.
    #[arg(long = "write-version", default_value_t = simple_archiver::MAX_FORMAT_VERSION)]
    pub write_version: u16,

    /// Minimum uncompressed chunk size before a chunk is sealed, e.g. `64MiB`.
    #[arg(long = "chunk-min-size")]
    pub chunk_min_size: Option<String>,

    /// Disable the default size-descending pre-sort of files before chunking.
    #[arg(long = "no-pre-sort-files")]
    pub no_pre_sort_files: bool,

    /// Sort files by name ascending instead of size descending.
    #[arg(long = "sort-files-by-name")]
    pub sort_files_by_name: bool,

    /// Do not archive empty directories (v2+).
    #[arg(long = "no-preserve-empty-dirs")]
    pub no_preserve_empty_dirs: bool,

    /// Force every entry's owner uid to this value.
    #[arg(long = "force-uid")]
    pub force_uid: Option<u32>,

    /// Force every entry's owner gid to this value.
    #[arg(long = "force-gid")]
    pub force_gid: Option<u32>,

    /// Force every entry's owner username to this value.
    #[arg(long = "force-user")]
    pub force_user: Option<String>,

    /// Force every entry's owner groupname to this value.
    #[arg(long = "force-group")]
    pub force_group: Option<String>,

    /// On extract, prefer the archived numeric uid over the archived username.
    #[arg(long = "extract-prefer-uid")]
    pub extract_prefer_uid: bool,

    /// On extract, prefer the archived numeric gid over the archived groupname.
    #[arg(long = "extract-prefer-gid")]
    pub extract_prefer_gid: bool,

    /// Repeatable `FROM:TO` username remap, applied on write and read.
    #[arg(long = "map-user", value_parser = parse_remap)]
    pub map_user: Vec<(String, String)>,

    /// Repeatable `FROM:TO` groupname remap, applied on write and read.
    #[arg(long = "map-group", value_parser = parse_remap)]
    pub map_group: Vec<(String, String)>,

    /// Force every extracted regular file to this octal permission mode.
    #[arg(long = "force-file-permissions", value_parser = parse_octal)]
    pub force_file_permissions: Option<u32>,

    /// Force every parent directory created during extraction to this octal mode.
    #[arg(long = "force-dir-permissions", value_parser = parse_octal)]
    pub force_dir_permissions: Option<u32>,

    /// Force every extracted empty directory to this octal permission mode.
    #[arg(long = "force-empty-dir-permissions", value_parser = parse_octal)]
    pub force_empty_dir_permissions: Option<u32>,

    /// Prefix prepended to every stored path (v4+); stripped on read.
    #[arg(long = "prefix")]
    pub prefix: Option<String>,

    /// Repeatable: whitelist entries whose path contains any of these substrings.
    #[arg(long = "whitelist-contains-any")]
    pub whitelist_contains_any: Vec<String>,

    /// Repeatable: whitelist entries whose path contains all of these substrings.
    #[arg(long = "whitelist-contains-all")]
    pub whitelist_contains_all: Vec<String>,

    /// Repeatable: whitelist entries whose path begins with any of these.
    #[arg(long = "whitelist-begins-with")]
    pub whitelist_begins_with: Vec<String>,

    /// Repeatable: whitelist entries whose path ends with any of these.
    #[arg(long = "whitelist-ends-with")]
    pub whitelist_ends_with: Vec<String>,

    /// Repeatable: blacklist entries whose path contains any of these substrings.
    #[arg(long = "blacklist-contains-any")]
    pub blacklist_contains_any: Vec<String>,

    /// Repeatable: blacklist entries whose path contains all of these substrings.
    #[arg(long = "blacklist-contains-all")]
    pub blacklist_contains_all: Vec<String>,

    /// Repeatable: blacklist entries whose path begins with any of these.
    #[arg(long = "blacklist-begins-with")]
    pub blacklist_begins_with: Vec<String>,

    /// Repeatable: blacklist entries whose path ends with any of these.
    #[arg(long = "blacklist-ends-with")]
    pub blacklist_ends_with: Vec<String>,

    /// Fold case before applying whitelist/blacklist predicates.
    #[arg(long = "wb-case-insensitive")]
    pub wb_case_insensitive: bool,

    /// Repeatable: add a `.ext` to the do-not-compress extension set.
    #[arg(long = "add-file-ext")]
    pub add_file_ext: Vec<String>,

    /// Load the built-in preset of already-compressed extensions (images,
    /// archives, video) into the do-not-compress set.
    #[arg(long = "use-file-exts-preset")]
    pub use_file_exts_preset: bool,

    /// Allow `..` path components instead of rejecting them.
    #[arg(long = "allow-double-dot")]
    pub allow_double_dot: bool,

    /// Directory for staging temp files (v0 per-file compression, v1+ chunking).
    #[arg(long = "temp-files-dir")]
    pub temp_files_dir: Option<PathBuf>,

    /// Use anonymous (already-unlinked) temp files instead of named ones.
    #[arg(long = "force-tmpfile")]
    pub force_tmpfile: bool,

    /// Recurse into directories when enumerating `inputs` (create mode).
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Notification verbosity: 0 silent .. 4 verbose.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

fn parse_remap(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((from, to)) => Ok((from.to_string(), to.to_string())),
        None => Err(format!("expected FROM:TO, got `{s}`")),
    }
}

fn parse_octal(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s, 8).map_err(|e| format!("invalid octal permission `{s}`: {e}"))
}

/// Parses a chunk-size string with an optional `KB|KiB|MB|MiB|GB|GiB` suffix
/// (§6.2 `--chunk-min-size N[KB|KiB|MB|MiB|GB|GiB]`).
pub fn parse_chunk_size(s: &str) -> Result<u64, String> {
    let suffixes: &[(&str, u64)] = &[
        ("KiB", 1024),
        ("MiB", 1024 * 1024),
        ("GiB", 1024 * 1024 * 1024),
        ("KB", 1000),
        ("MB", 1_000_000),
        ("GB", 1_000_000_000),
    ];
    for (suffix, multiplier) in suffixes {
        if let Some(digits) = s.strip_suffix(suffix) {
            let n: u64 = digits
                .trim()
                .parse()
                .map_err(|e| format!("invalid chunk size `{s}`: {e}"))?;
            return Ok(n * multiplier);
        }
    }
    s.parse().map_err(|e| format!("invalid chunk size `{s}`: {e}"))
}
