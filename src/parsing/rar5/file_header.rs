//! RAR5 file header parser.
//!
//! The file header contains information about each file in the archive,
//! including name, size, compression method, and timestamps. Only the
//! block-specific region is decoded here; the common block fields and the
//! trailing extra area are handled by the chain parser.

use super::VintReader;
use crate::error::{RarError, Result};

/// Extra-area record type carrying file encryption parameters.
const FHEXTRA_CRYPT: u64 = 0x01;

/// RAR5 file flags (specific to file header).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rar5FileFlags {
    /// File is a directory
    pub is_directory: bool,
    /// File modification time is present
    pub has_mtime: bool,
    /// File CRC32 is present
    pub has_crc32: bool,
    /// Unpacked size is unknown
    pub unpacked_size_unknown: bool,
}

impl From<u64> for Rar5FileFlags {
    fn from(flags: u64) -> Self {
        Self {
            is_directory: flags & 0x0001 != 0,
            has_mtime: flags & 0x0002 != 0,
            has_crc32: flags & 0x0004 != 0,
            unpacked_size_unknown: flags & 0x0008 != 0,
        }
    }
}

/// RAR5 compression information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rar5CompressionInfo {
    /// Compression algorithm version
    pub version: u8,
    /// Solid flag
    pub is_solid: bool,
    /// Compression method (0 = store, 1-5 = compression levels)
    pub method: u8,
    /// Dictionary size as power of 2 (minimum 17 = 128KB)
    pub dict_size_log: u8,
    /// The undecoded field.
    pub raw: u64,
}

impl From<u64> for Rar5CompressionInfo {
    fn from(info: u64) -> Self {
        Self {
            version: (info & 0x3F) as u8,
            is_solid: (info >> 6) & 1 != 0,
            method: ((info >> 7) & 0x07) as u8,
            dict_size_log: ((info >> 10) & 0x0F) as u8 + 17,
            raw: info,
        }
    }
}

impl Rar5CompressionInfo {
    /// Stored means the whole field is zero. A zero method with dictionary,
    /// solid or version bits set is not treated as stored.
    pub fn is_stored(&self) -> bool {
        self.raw == 0
    }
}

/// RAR5 host OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Rar5HostOs {
    Windows = 0,
    Unix = 1,
}

impl TryFrom<u64> for Rar5HostOs {
    type Error = ();

    fn try_from(value: u64) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Windows),
            1 => Ok(Self::Unix),
            _ => Err(()),
        }
    }
}

/// Parsed RAR5 file header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rar5FileHeader {
    /// File-specific flags
    pub file_flags: Rar5FileFlags,
    /// Unpacked (original) file size, 0 when flagged unknown
    pub unpacked_size: u64,
    /// File attributes
    pub attributes: u64,
    /// Modification time (if present)
    pub mtime: Option<u32>,
    /// File CRC32 (if present)
    pub file_crc32: Option<u32>,
    /// Compression info
    pub compression: Rar5CompressionInfo,
    /// Raw host OS code
    pub host_os: u64,
    /// File name (UTF-8)
    pub name: String,
}

impl Rar5FileHeader {
    /// Check if file is stored (not compressed).
    pub fn is_stored(&self) -> bool {
        self.compression.is_stored()
    }

    /// Check if file is a directory.
    pub fn is_directory(&self) -> bool {
        self.file_flags.is_directory
    }

    pub fn host_os(&self) -> Option<Rar5HostOs> {
        Rar5HostOs::try_from(self.host_os).ok()
    }
}

/// Whether a file block's extra area carries an encryption record.
pub fn has_encryption_record(extra: &[u8]) -> bool {
    find_extra_field(extra, FHEXTRA_CRYPT).is_some()
}

/// Find a specific extra field by type.
pub fn find_extra_field(extra: &[u8], field_type: u64) -> Option<&[u8]> {
    let mut pos = 0;
    while pos < extra.len() {
        // Each extra field: size (vint), type (vint), data
        // size = total size of type + data (does NOT include the size vint itself)
        let mut reader = VintReader::new(&extra[pos..]);
        let size = usize::try_from(reader.read().ok()?).ok()?;
        let size_vint_len = reader.position();
        let ftype = reader.read().ok()?;
        let header_consumed = reader.position();

        let data_end = pos.checked_add(size_vint_len)?.checked_add(size)?;
        if ftype == field_type {
            let data_start = pos + header_consumed;
            if data_end <= extra.len() && data_start <= data_end {
                return Some(&extra[data_start..data_end]);
            }
        }

        if size == 0 {
            return None;
        }
        pos = data_end;
    }
    None
}

pub struct Rar5FileHeaderParser;

impl Rar5FileHeaderParser {
    /// Parse the block-specific region of a file header (type 2). The region
    /// excludes the common fields and the trailing extra area;
    /// `header_offset` is used for error context only.
    pub fn parse(region: &[u8], header_offset: u64) -> Result<Rar5FileHeader> {
        let mut reader = VintReader::new(region);

        let file_flags = Rar5FileFlags::from(reader.field("file flags")?);
        let unpacked_size = reader.field("unpacked size")?;
        let attributes = reader.field("file attributes")?;

        // Modification time (if present)
        let mtime = if file_flags.has_mtime {
            Some(reader.read_u32_le().ok_or(RarError::TruncatedField {
                field: "mtime",
                offset: header_offset,
            })?)
        } else {
            None
        };

        // File CRC32 (if present)
        let file_crc32 = if file_flags.has_crc32 {
            Some(reader.read_u32_le().ok_or(RarError::TruncatedField {
                field: "crc32",
                offset: header_offset,
            })?)
        } else {
            None
        };

        let compression = Rar5CompressionInfo::from(reader.field("compression info")?);
        let host_os = reader.field("host os")?;

        // Name length and name
        let name_len = reader.field("name length")?;
        let available = reader.remaining().len();
        let name_bytes = usize::try_from(name_len)
            .ok()
            .filter(|&len| len > 0)
            .and_then(|len| reader.read_bytes(len))
            .ok_or(RarError::InvalidNameLength {
                length: name_len,
                available,
            })?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        Ok(Rar5FileHeader {
            file_flags,
            unpacked_size: if file_flags.unpacked_size_unknown {
                0
            } else {
                unpacked_size
            },
            attributes,
            mtime,
            file_crc32,
            compression,
            host_os,
            name,
        })
    }
}
