//! Error taxonomy for archive creation, examination, and extraction.
//!
//! Mirrors the kind-based (not string-compare) error design used throughout
//! this codebase: one enum, one discriminant per failure class, a hand-written
//! `Display` and `Error` impl.

use std::fmt;
use std::io;

/// A single archiver failure, tagged by kind rather than by message text.
#[derive(Debug)]
pub enum ArchiverError {
    /// Any reader short-read, or a magic/version mismatch.
    InvalidFile(String),
    /// The archive file already exists and `--overwrite-create` was not given.
    OverwriteRefused(String),
    /// The archive file could not be opened/created for writing.
    FailedToOpenForWrite(io::Error),
    /// Writer sink I/O failed after the archive was already open.
    FailedToWrite(io::Error),
    /// A compressor command was required but none is configured.
    NoCompressor,
    /// A decompressor command was required but none is configured.
    NoDecompressor,
    /// Pre-flight validation found an inconsistent parsed state.
    InvalidParsedState(String),
    /// The requested write version is not one of 0..=5.
    InvalidWriteVersion(u16),
    /// Pipe setup, fork/exec, or decompressor-drain mismatch.
    InternalError(String),
    /// Failed to build an identity remap table.
    FailedToCreateMap(String),
    /// Failed to create a symlink on extraction.
    FailedToExtractSymlink(io::Error),
    /// Failed to change the working directory for extraction.
    FailedToChangeCwd(io::Error),
    /// The compressor child exited non-zero, or wrote after SIGPIPE.
    CompressionError(String),
    /// The decompressor child exited non-zero.
    DecompressionError(String),
    /// chmod on extract failed; best-effort, logged as a warning by the caller.
    PermissionSetFail(io::Error),
    /// chown on extract failed; best-effort, logged as a warning by the caller.
    UidGidSetFail(io::Error),
    /// SIGINT observed during a read or write.
    SigInt,
    /// Temp-file collision avoidance was exhausted.
    TooManyDirs,
}

impl fmt::Display for ArchiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiverError::InvalidFile(msg) => write!(f, "invalid archive file: {msg}"),
            ArchiverError::OverwriteRefused(msg) => write!(f, "{msg}"),
            ArchiverError::FailedToOpenForWrite(e) => {
                write!(f, "failed to open archive for writing: {e}")
            }
            ArchiverError::FailedToWrite(e) => write!(f, "failed to write archive: {e}"),
            ArchiverError::NoCompressor => write!(f, "no compressor command configured"),
            ArchiverError::NoDecompressor => write!(f, "no decompressor command configured"),
            ArchiverError::InvalidParsedState(msg) => write!(f, "invalid parsed state: {msg}"),
            ArchiverError::InvalidWriteVersion(v) => {
                write!(f, "invalid write version: {v} (expected 0..=5)")
            }
            ArchiverError::InternalError(msg) => write!(f, "internal error: {msg}"),
            ArchiverError::FailedToCreateMap(msg) => {
                write!(f, "failed to build identity map: {msg}")
            }
            ArchiverError::FailedToExtractSymlink(e) => {
                write!(f, "failed to extract symlink: {e}")
            }
            ArchiverError::FailedToChangeCwd(e) => write!(f, "failed to change directory: {e}"),
            ArchiverError::CompressionError(msg) => write!(f, "compression error: {msg}"),
            ArchiverError::DecompressionError(msg) => write!(f, "decompression error: {msg}"),
            ArchiverError::PermissionSetFail(e) => write!(f, "failed to set permissions: {e}"),
            ArchiverError::UidGidSetFail(e) => write!(f, "failed to set owner: {e}"),
            ArchiverError::SigInt => write!(f, "interrupted by SIGINT"),
            ArchiverError::TooManyDirs => write!(f, "too many temp-file name collisions"),
        }
    }
}

impl std::error::Error for ArchiverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiverError::FailedToOpenForWrite(e)
            | ArchiverError::FailedToWrite(e)
            | ArchiverError::FailedToExtractSymlink(e)
            | ArchiverError::FailedToChangeCwd(e)
            | ArchiverError::PermissionSetFail(e)
            | ArchiverError::UidGidSetFail(e) => Some(e),
            _ => None,
        }
    }
}

/// Generic I/O failures default to `InternalError`; call sites that know a more
/// specific taxonomy kind applies should construct that variant directly
/// instead of relying on this conversion.
impl From<io::Error> for ArchiverError {
    fn from(e: io::Error) -> Self {
        ArchiverError::InternalError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArchiverError>;

/// Maps an [`ArchiverError`] to the process exit code table in the CLI surface.
///
/// | Code | Meaning |
/// |---|---|
/// | 0 | success |
/// | 1 | usage / overwrite refusal |
/// | 2 | open-for-write failure |
/// | 3 | write failure (archive removed) |
/// | 4 | open-for-read failure |
/// | 5 | extract-read failure |
/// | 6 | missing filename |
/// | 7 | argument parse failure |
/// | 9 | mutually-exclusive-option failure |
pub fn exit_code_for(err: &ArchiverError) -> i32 {
    match err {
        ArchiverError::OverwriteRefused(_) => 1,
        ArchiverError::FailedToOpenForWrite(_) => 2,
        ArchiverError::FailedToWrite(_) => 3,
        ArchiverError::InvalidFile(_) => 4,
        ArchiverError::NoCompressor | ArchiverError::NoDecompressor => 1,
        ArchiverError::InvalidParsedState(_) | ArchiverError::InvalidWriteVersion(_) => 7,
        ArchiverError::InternalError(_) => 5,
        ArchiverError::FailedToCreateMap(_)
        | ArchiverError::FailedToExtractSymlink(_)
        | ArchiverError::FailedToChangeCwd(_) => 5,
        ArchiverError::CompressionError(_) => 3,
        ArchiverError::DecompressionError(_) => 5,
        ArchiverError::PermissionSetFail(_) | ArchiverError::UidGidSetFail(_) => 0,
        ArchiverError::SigInt => 1,
        ArchiverError::TooManyDirs => 5,
    }
}
