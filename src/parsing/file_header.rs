//! RAR 1.5-4.x file header fields.
//!
//! After the block header, a file block carries a 25-byte fixed region:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | packed size (low 32 bits) |
//! | 4 | 4 | unpacked size (low 32 bits) |
//! | 8 | 1 | host OS |
//! | 9 | 4 | file CRC32 |
//! | 13 | 4 | DOS timestamp |
//! | 17 | 1 | unpack version |
//! | 18 | 1 | method |
//! | 19 | 2 | name length |
//! | 21 | 4 | attributes |
//!
//! Then optionally two high-size words, the name, and an 8-byte salt.
//! Some writers put the name length at offset 15 instead; see
//! [`NameLengthLayout`].

/// Size of the fixed region.
pub const FIXED_SIZE: usize = 25;

/// Data continues in the next volume.
pub const FILE_SPLIT_AFTER: u16 = 0x0002;
pub const FILE_ENCRYPTED: u16 = 0x0004;
/// Two extra 32-bit words with the high halves of both sizes.
pub const FILE_HIGH_SIZE: u16 = 0x0100;
pub const FILE_UNICODE_NAME: u16 = 0x0200;
/// 8-byte salt after the name.
pub const FILE_SALT: u16 = 0x0400;

/// "No compression".
pub const METHOD_STORE: u8 = 0x30;
/// Version 1 / method 1 as written by solid archives created with `-m0`.
pub const METHOD_SOLID_STORE: u8 = 0x81;

/// Where the name length lives in the fixed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameLengthLayout {
    /// Offset 19.
    #[default]
    Canonical,
    /// Offset 15, seen in the wild in place of the canonical position.
    Shifted,
}

impl NameLengthLayout {
    pub fn offset(self) -> usize {
        match self {
            Self::Canonical => 19,
            Self::Shifted => 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeaderFields {
    pub packed_size: u32,
    pub unpacked_size: u32,
    pub host_os: u8,
    pub file_crc: u32,
    pub timestamp: u32,
    pub version: u8,
    pub method: u8,
    pub name_size: u16,
    pub attributes: u32,
}

impl FileHeaderFields {
    pub fn parse(fixed: &[u8; FIXED_SIZE], layout: NameLengthLayout) -> Self {
        let u32_at = |at: usize| u32::from_le_bytes([fixed[at], fixed[at + 1], fixed[at + 2], fixed[at + 3]]);
        let name_at = layout.offset();

        Self {
            packed_size: u32_at(0),
            unpacked_size: u32_at(4),
            host_os: fixed[8],
            file_crc: u32_at(9),
            timestamp: u32_at(13),
            version: fixed[17],
            method: fixed[18],
            name_size: u16::from_le_bytes([fixed[name_at], fixed[name_at + 1]]),
            attributes: u32_at(21),
        }
    }
}

/// Combine low and high 32-bit halves.
pub fn wide_size(low: u32, high: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Stored-payload classification for a file block.
///
/// A file is stored when its sizes match, the method is the store code, or
/// the method's low nibble is zero. With `solid_store_heuristic`, the solid
/// `-m0` method byte is accepted too.
pub fn is_stored(packed: u64, unpacked: u64, method: u8, solid_store_heuristic: bool) -> bool {
    packed == unpacked
        || method == METHOD_STORE
        || method & 0x0F == 0
        || (solid_store_heuristic && method == METHOD_SOLID_STORE)
}

/// Keep printable ASCII only. Length prefixes and other control bytes
/// occasionally end up inside the name field.
pub fn printable_name(field: &[u8]) -> String {
    field
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| char::from(b))
        .collect()
}
