//! Synthetic volume builders for unit tests.

use crate::formats::Signature;
use crate::parsing::block_header::{FILE_BLOCK, MAIN_BLOCK};
use crate::parsing::file_header::{FILE_SPLIT_AFTER, FIXED_SIZE, METHOD_STORE};

/// One RAR 1.5-4.x file block and its payload.
pub struct Rar4File<'a> {
    pub name: &'a str,
    pub payload: &'a [u8],
    pub unpacked: u32,
    pub method: u8,
    pub flags: u16,
}

impl<'a> Rar4File<'a> {
    pub fn stored(name: &'a str, payload: &'a [u8]) -> Self {
        Self {
            name,
            payload,
            unpacked: payload.len() as u32,
            method: METHOD_STORE,
            flags: 0,
        }
    }

    /// A part of a file split across volumes.
    pub fn part(name: &'a str, payload: &'a [u8], unpacked: u32, split_after: bool) -> Self {
        Self {
            unpacked,
            flags: if split_after { FILE_SPLIT_AFTER } else { 0 },
            ..Self::stored(name, payload)
        }
    }

    /// Signature, main header, this file block, payload.
    pub fn volume(&self) -> Vec<u8> {
        let mut out = Signature::RAR15.to_vec();
        out.extend_from_slice(&[0x00, 0x00, MAIN_BLOCK, 0x00, 0x00, 13, 0x00]);
        out.extend_from_slice(&[0u8; 6]);

        let size = 7 + FIXED_SIZE + self.name.len();
        out.extend_from_slice(&[0x00, 0x00, FILE_BLOCK]);
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&(size as u16).to_le_bytes());
        let mut fixed = [0u8; FIXED_SIZE];
        fixed[0..4].copy_from_slice(&(self.payload.len() as u32).to_le_bytes());
        fixed[4..8].copy_from_slice(&self.unpacked.to_le_bytes());
        fixed[18] = self.method;
        fixed[19..21].copy_from_slice(&(self.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&fixed);
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(self.payload);
        out
    }
}

/// Offset of the payload in a [`Rar4File::volume`].
pub fn rar4_data_offset(name: &str) -> u64 {
    (7 + 13 + 7 + FIXED_SIZE + name.len()) as u64
}
