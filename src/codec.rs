//! Byte codec: big-endian integer (de)serialization, length-prefixed strings,
//! and the 4-byte little-endian `Flags4` bitset block.
//!
//! All reads are bounded and exact: a short read anywhere in this module
//! surfaces as [`ArchiverError::InvalidFile`]; a short write surfaces as
//! [`ArchiverError::FailedToWrite`].

use std::io::{self, Read, Write};

use crate::error::{ArchiverError, Result};

/// Reads an exact-length buffer, mapping any I/O failure or short read to
/// `InvalidFile`. This is the single point every bounded-read primitive in
/// this module (and, transitively, every reader in the crate) routes through,
/// which is also where the "declared chunk length exceeds remaining stream"
/// open question resolves to `InvalidFile` (see DESIGN.md).
pub fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            ArchiverError::InvalidFile("unexpected end of stream".to_string())
        }
        _ => ArchiverError::InvalidFile(e.to_string()),
    })
}

fn write_all(w: &mut impl Write, buf: &[u8]) -> Result<()> {
    w.write_all(buf).map_err(ArchiverError::FailedToWrite)
}

pub fn read_u16(r: &mut impl Read) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(r, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn write_u16(w: &mut impl Write, v: u16) -> Result<()> {
    write_all(w, &v.to_be_bytes())
}

pub fn read_u32(r: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u32(w: &mut impl Write, v: u32) -> Result<()> {
    write_all(w, &v.to_be_bytes())
}

pub fn read_u64(r: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

pub fn write_u64(w: &mut impl Write, v: u64) -> Result<()> {
    write_all(w, &v.to_be_bytes())
}

/// Writes a length-prefixed, NUL-terminated byte string: `u16 len`, the raw
/// bytes, then a trailing `0x00`. `len` is `s.len()`, not `s.len() + 1`.
pub fn write_str(w: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(ArchiverError::InvalidParsedState(format!(
            "string of {} bytes exceeds the 65535-byte length prefix",
            bytes.len()
        )));
    }
    write_u16(w, bytes.len() as u16)?;
    write_all(w, bytes)?;
    write_all(w, &[0u8])
}

/// Reads a length-prefixed, NUL-terminated byte string. Reads exactly
/// `len + 1` bytes (the body plus the producer's trailing NUL), strips the
/// NUL, and caps the decoded string at `len` bytes regardless of whether a
/// well-behaved producer's trailing byte was actually zero — a permissive
/// reader tolerates but does not require it to be NUL.
pub fn read_str(r: &mut impl Read) -> Result<String> {
    let len = read_u16(r)? as usize;
    let mut buf = vec![0u8; len + 1];
    read_exact(r, &mut buf)?;
    buf.truncate(len);
    String::from_utf8(buf)
        .map_err(|e| ArchiverError::InvalidFile(format!("non-UTF-8 string: {e}")))
}

/// Reads a length-prefixed string that may be "absent", encoded per §6.1 as a
/// zero-length string (`u16_str:abs_or_zero`). Returns `None` when the decoded
/// string is empty.
pub fn read_opt_str(r: &mut impl Read) -> Result<Option<String>> {
    let s = read_str(r)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

/// Writes an optional length-prefixed string, encoding `None` as `u16 0`
/// (§6.1 `u16_str:abs_or_zero`).
pub fn write_opt_str(w: &mut impl Write, s: Option<&str>) -> Result<()> {
    write_str(w, s.unwrap_or(""))
}

/// The 4-byte `Flags4` bitset block: a little-endian bitset indexed first by
/// byte, then by bit. §6.1 fixes the meaning of individual bits per context
/// (header flag block vs. per-entry flag block); this type only knows how to
/// get and set bits, not what they mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags4(pub [u8; 4]);

impl Flags4 {
    pub const fn zero() -> Self {
        Flags4([0, 0, 0, 0])
    }

    pub fn get(&self, byte: usize, bit: u8) -> bool {
        (self.0[byte] >> bit) & 1 == 1
    }

    pub fn set(&mut self, byte: usize, bit: u8, value: bool) {
        if value {
            self.0[byte] |= 1 << bit;
        } else {
            self.0[byte] &= !(1 << bit);
        }
    }

    pub fn read(r: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; 4];
        read_exact(r, &mut buf)?;
        Ok(Flags4(buf))
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        write_all(w, &self.0)
    }
}
