//! RAR 1.5-4.x block header.
//!
//! Every block starts with `CRC16 (2) | type (1) | flags (2) | size (2)`,
//! followed by a 4-byte ADD_SIZE word when flag `0x8000` is set. The full
//! block spans `size + add_size` bytes from its first byte.

use crate::error::Result;
use crate::volume_reader::VolumeReader;

pub const MAIN_BLOCK: u8 = 0x73;
pub const FILE_BLOCK: u8 = 0x74;
pub const END_BLOCK: u8 = 0x7B;

/// ADD_SIZE word present.
pub const LONG_BLOCK: u16 = 0x8000;

/// Main header flags marking encrypted header metadata.
pub const MAIN_ENCRYPTED_HEADERS: u16 = 0x0080;
pub const MAIN_ENCRYPT_VERSION: u16 = 0x0200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub crc: u16,
    pub header_type: u8,
    pub flags: u16,
    pub size: u16,
    pub add_size: Option<u32>,
}

impl BlockHeader {
    pub const BASE_SIZE: usize = 7;

    /// Decode the fixed 7-byte part.
    pub fn parse(buffer: &[u8; Self::BASE_SIZE]) -> Self {
        Self {
            crc: u16::from_le_bytes([buffer[0], buffer[1]]),
            header_type: buffer[2],
            flags: u16::from_le_bytes([buffer[3], buffer[4]]),
            size: u16::from_le_bytes([buffer[5], buffer[6]]),
            add_size: None,
        }
    }

    /// Read a block header. `Ok(None)` means the volume ended cleanly before
    /// the block; a partial header is an error.
    pub fn read(reader: &mut VolumeReader) -> Result<Option<Self>> {
        let mut base = [0u8; Self::BASE_SIZE];
        if !reader.read_exact_or_eof(&mut base)? {
            return Ok(None);
        }
        let mut header = Self::parse(&base);
        if header.flags & LONG_BLOCK != 0 {
            let mut add = [0u8; 4];
            reader.read_exact(&mut add)?;
            header.add_size = Some(u32::from_le_bytes(add));
        }
        Ok(Some(header))
    }

    /// Bytes consumed by [`read`](Self::read): 7, or 11 with ADD_SIZE.
    pub fn encoded_len(&self) -> u64 {
        Self::BASE_SIZE as u64 + if self.add_size.is_some() { 4 } else { 0 }
    }

    /// Full block length, header plus payload.
    pub fn total_size(&self) -> u64 {
        u64::from(self.size) + u64::from(self.add_size.unwrap_or(0))
    }

    /// A main header whose flags announce encrypted headers.
    pub fn is_encrypted_main(&self) -> bool {
        self.header_type == MAIN_BLOCK && is_encrypted_main_flags(self.flags)
    }
}

pub fn is_encrypted_main_flags(flags: u16) -> bool {
    flags & (MAIN_ENCRYPTED_HEADERS | MAIN_ENCRYPT_VERSION) != 0
}
