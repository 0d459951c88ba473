//! Shared version-parameterized format descriptor (§9 design note): the six
//! writer/reader bodies are driven by one `FormatTraits` value rather than
//! six near-duplicate functions.

use crate::config::MAX_WRITE_VERSION;
use crate::error::{ArchiverError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkSizeFields {
    CompressedOnly,
    UncompressedAndCompressed,
}

/// Which wire features this version's body carries. Built once per `create`
/// call from the requested version number.
#[derive(Clone, Copy, Debug)]
pub struct FormatTraits {
    pub version: u16,
    pub has_chunking: bool,
    pub has_empty_dir_section: bool,
    pub has_uname_gname: bool,
    pub has_prefix: bool,
    pub has_per_file_raw_bit: bool,
    pub chunk_size_fields: ChunkSizeFields,
}

impl FormatTraits {
    pub fn for_version(version: u16) -> Result<Self> {
        if version > MAX_WRITE_VERSION {
            return Err(ArchiverError::InvalidWriteVersion(version));
        }
        Ok(FormatTraits {
            version,
            has_chunking: version >= 1,
            has_empty_dir_section: version >= 2,
            has_uname_gname: version >= 3,
            has_prefix: version >= 4,
            has_per_file_raw_bit: version == 5,
            chunk_size_fields: if version == 5 {
                ChunkSizeFields::UncompressedAndCompressed
            } else {
                ChunkSizeFields::CompressedOnly
            },
        })
    }
}
