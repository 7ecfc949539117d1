//! RAR5 format parsing.
//!
//! RAR5 uses a completely different header format than RAR4:
//! - Variable-length integers (vint) for sizes
//! - CRC-32 instead of CRC-16
//! - An optional extra area at the end of each header
//!
//! Every block is `CRC32 (4) | header size (vint) | header content`, where the
//! header size counts the content bytes only. The chain parser collects every
//! file block in the volume.

pub mod file_header;
pub mod vint;

pub use file_header::{
    find_extra_field, Rar5CompressionInfo, Rar5FileFlags, Rar5FileHeader, Rar5FileHeaderParser,
    Rar5HostOs,
};
pub use vint::{read_vint, write_vint, VintReader};

use tracing::{debug, trace};

use self::file_header::has_encryption_record;
use self::vint::read_vint_from;
use crate::error::{RarError, Result};
use crate::formats::Signature;
use crate::volume_index::FileBlock;
use crate::volume_reader::VolumeReader;

/// Sanity ceiling for a single header.
pub const MAX_HEADER_SIZE: u64 = 2 * 1024 * 1024;

/// RAR5 header type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Rar5HeaderType {
    /// Main archive header
    Main = 1,
    /// File header
    File = 2,
    /// Service header (e.g., NTFS streams, ACL)
    Service = 3,
    /// Encryption header
    Encryption = 4,
    /// End of archive header
    End = 5,
}

impl TryFrom<u64> for Rar5HeaderType {
    type Error = ();

    fn try_from(value: u64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Main),
            2 => Ok(Self::File),
            3 => Ok(Self::Service),
            4 => Ok(Self::Encryption),
            5 => Ok(Self::End),
            _ => Err(()),
        }
    }
}

/// RAR5 common header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rar5HeaderFlags {
    /// Extra area is present after header
    pub has_extra_area: bool,
    /// Data area is present after header
    pub has_data_area: bool,
    /// Skip header if unknown type
    pub skip_if_unknown: bool,
    /// Data continues from previous volume
    pub split_before: bool,
    /// Data continues in next volume
    pub split_after: bool,
}

impl From<u64> for Rar5HeaderFlags {
    fn from(flags: u64) -> Self {
        Self {
            has_extra_area: flags & 0x0001 != 0,
            has_data_area: flags & 0x0002 != 0,
            skip_if_unknown: flags & 0x0004 != 0,
            split_before: flags & 0x0008 != 0,
            split_after: flags & 0x0010 != 0,
        }
    }
}

/// Common fields of one block, decoded from its header content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rar5BlockHeader {
    pub header_type: u64,
    pub flags: Rar5HeaderFlags,
    pub extra_area_size: u64,
    pub data_size: u64,
    /// Start of the type-specific fields within the content.
    pub fields_start: usize,
    /// End of the type-specific fields; the extra area follows.
    pub fields_end: usize,
}

impl Rar5BlockHeader {
    /// Decode the common fields of `content` (the bytes counted by the
    /// header size field).
    pub fn parse(content: &[u8]) -> Result<Self> {
        let mut reader = VintReader::new(content);

        let header_type = reader.field("block type")?;
        let flags = Rar5HeaderFlags::from(reader.field("block flags")?);
        let extra_area_size = if flags.has_extra_area {
            reader.field("extra area size")?
        } else {
            0
        };
        let data_size = if flags.has_data_area {
            reader.field("data size")?
        } else {
            0
        };

        // The extra area sits at the very end of the header.
        let fields_start = reader.position();
        let available = content.len() - fields_start;
        let extra = usize::try_from(extra_area_size)
            .ok()
            .filter(|&extra| extra <= available)
            .ok_or(RarError::ExtraAreaOverflow {
                extra: extra_area_size,
                available: available as u64,
            })?;

        Ok(Self {
            header_type,
            flags,
            extra_area_size,
            data_size,
            fields_start,
            fields_end: content.len() - extra,
        })
    }

    pub fn kind(&self) -> Option<Rar5HeaderType> {
        Rar5HeaderType::try_from(self.header_type).ok()
    }
}

/// Walk the block chain of a RAR5 volume.
///
/// `reader` must be positioned on the signature. Every file block is
/// returned in order. Parsing stops cleanly at the end-of-archive block, at
/// a zero header size, or when a header or data region would run past the
/// known volume size.
pub fn parse_volume(reader: &mut VolumeReader) -> Result<Vec<FileBlock>> {
    reader.skip(Signature::Rar50.size())?;
    let volume_len = reader.known_size();
    let mut blocks = Vec::new();

    loop {
        let header_offset = reader.position();
        if volume_len.is_some_and(|len| header_offset >= len) {
            break;
        }

        let mut crc = [0u8; 4];
        if !reader.read_exact_or_eof(&mut crc)? {
            break;
        }
        let (head_size, head_size_len) = read_vint_from(reader, "header size")?;
        if head_size == 0 {
            debug!(offset = header_offset, "zero header size, stopping");
            break;
        }
        if head_size > MAX_HEADER_SIZE {
            return Err(RarError::SuspiciousHeaderSize {
                size: head_size,
                offset: header_offset,
            });
        }
        if runs_past(volume_len, reader.position(), head_size) {
            debug!(
                offset = header_offset,
                head_size, "header runs past end of volume, stopping"
            );
            break;
        }

        let content = reader.read_vec(head_size as usize)?;
        let block = Rar5BlockHeader::parse(&content)?;
        trace!(
            offset = header_offset,
            block_type = block.header_type,
            head_size,
            extra = block.extra_area_size,
            data = block.data_size,
            "rar5 block"
        );

        match block.kind() {
            Some(Rar5HeaderType::File) => {
                let header = Rar5FileHeaderParser::parse(
                    &content[block.fields_start..block.fields_end],
                    header_offset,
                )?;
                let header_len = 4 + head_size_len as u64 + head_size;
                let mut file = FileBlock::new(
                    header.name,
                    header_offset,
                    header_len,
                    block.data_size,
                    header.unpacked_size,
                )
                .clamp_to_volume(volume_len);
                file.stored = header.compression.is_stored();
                file.encrypted = has_encryption_record(&content[block.fields_end..]);
                file.continued |= block.flags.split_after;
                trace!(
                    name = %file.name,
                    packed = file.packed_size,
                    unpacked = file.unpacked_size,
                    stored = file.stored,
                    "rar5 file"
                );
                blocks.push(file);
            }
            Some(Rar5HeaderType::Encryption) => return Err(RarError::PasswordProtected),
            Some(Rar5HeaderType::End) => break,
            _ => {}
        }

        if block.data_size > 0 {
            if runs_past(volume_len, reader.position(), block.data_size) {
                debug!(
                    offset = header_offset,
                    data = block.data_size,
                    "data area runs past end of volume, stopping"
                );
                break;
            }
            reader.skip(block.data_size)?;
        }
    }

    Ok(blocks)
}

/// Whether `size` bytes starting at `position` reach past the known volume
/// end. Sizes come straight from the file and may be anywhere up to
/// `u64::MAX`.
fn runs_past(volume_len: Option<u64>, position: u64, size: u64) -> bool {
    volume_len.is_some_and(|len| position.checked_add(size).map_or(true, |end| end > len))
}
