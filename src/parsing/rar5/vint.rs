//! Variable-length integer (vint) codec for RAR5.
//!
//! RAR5 uses variable-length integers where each byte contributes 7 bits
//! of data, and the high bit indicates if more bytes follow.
//!
//! Format:
//! - Bits 0-6: Data bits (least significant group first)
//! - Bit 7: Continuation flag (1 = more bytes follow)
//!
//! A vint is at most [`MAX_VINT_LEN`] bytes long.

use crate::error::{RarError, Result, VintError};
use crate::volume_reader::VolumeReader;

/// Longest accepted encoding (70 payload bits).
pub const MAX_VINT_LEN: usize = 10;

/// Read a variable-length integer from a byte slice.
/// Returns the value and the number of bytes consumed.
#[inline]
pub fn read_vint(data: &[u8]) -> std::result::Result<(u64, usize), VintError> {
    if data.is_empty() {
        return Err(VintError::UnexpectedEnd);
    }

    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in data.iter().take(MAX_VINT_LEN).enumerate() {
        result |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    // Ran out of bytes, or hit the cap, with the continuation bit set
    Err(VintError::TooLong)
}

/// Read a vint from a volume stream, consuming only its bytes.
pub(crate) fn read_vint_from(reader: &mut VolumeReader, field: &'static str) -> Result<(u64, usize)> {
    let window = reader.peek(MAX_VINT_LEN)?;
    let (value, len) = read_vint(window).map_err(RarError::field(field))?;
    reader.consume(len);
    Ok((value, len))
}

/// Append the vint encoding of `value` to `out`, returning its length.
pub fn write_vint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out.len() - start
}

/// Helper for reading multiple vints from a header buffer.
pub struct VintReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> VintReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Read the next vint from the buffer.
    #[inline]
    pub fn read(&mut self) -> std::result::Result<u64, VintError> {
        let (value, consumed) = read_vint(self.remaining())?;
        self.offset += consumed;
        Ok(value)
    }

    /// Read the next vint, tagging failures with the field name.
    #[inline]
    pub fn field(&mut self, name: &'static str) -> Result<u64> {
        self.read().map_err(RarError::field(name))
    }

    /// Read a fixed number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(count)?;
        let slice = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    /// Read a u32 in little-endian format.
    #[inline]
    pub fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Current position in the buffer.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Remaining bytes in the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }
}
