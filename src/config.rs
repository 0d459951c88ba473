//! Compile-time configuration constants.

/// Literal magic bytes at the start of every archive, before the version field.
pub const MAGIC: &[u8; 18] = b"SIMPLE_ARCHIVE_VER";

/// Highest archive format version this crate can write or read.
pub const MAX_WRITE_VERSION: u16 = 5;

/// Default minimum uncompressed size a chunk must reach before it is sealed
/// (v1+ chunking algorithm, §4.6).
pub const DEFAULT_CHUNK_MIN_SIZE: u64 = 256 * 1024 * 1024;

/// Default permission bits applied to extracted regular files when the
/// archive entry carries none (non-unix cfg) and no `--force-file-permissions`
/// override is given.
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

/// Default permission bits applied to directories created to hold extracted
/// files.
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o755;

/// Default permission bits applied to extracted empty-directory entries (v2+).
pub const DEFAULT_EMPTY_DIR_PERMISSIONS: u32 = 0o755;

/// Chunk size read from / written to the transfer loop's pipe buffers
/// (§4.2 transfer loop).
pub const PIPE_TRANSFER_CHUNK_SIZE: usize = 1024;

/// Permission mode applied to temp files created for v0 per-file compression
/// and v1+ chunk staging (mode "0600-equivalent" per §5).
pub const TEMP_FILE_MODE: u32 = 0o600;

/// Upper bound on attempts to find a collision-free temp-file name before
/// giving up with `TooManyDirs`.
pub const MAX_TEMP_FILE_ATTEMPTS: u32 = 1000;
