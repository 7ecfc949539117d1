//! Tolerant scanner for RAR 1.5-2.x volumes.
//!
//! Instead of following the block chain, the scanner looks for the file
//! block type byte inside a read-ahead window and accepts the first
//! candidate whose header is structurally plausible. It is only used when
//! the strict parser finds nothing.

use tracing::{debug, trace};

use super::block_header::{is_encrypted_main_flags, FILE_BLOCK, MAIN_BLOCK};
use super::file_header::{
    wide_size, FileHeaderFields, NameLengthLayout, FILE_ENCRYPTED, FILE_HIGH_SIZE,
    FILE_SPLIT_AFTER, FILE_UNICODE_NAME, FIXED_SIZE, METHOD_STORE,
};
use super::unicode_name::decode_name_field;
use crate::error::{RarError, Result};
use crate::volume_index::FileBlock;
use crate::volume_reader::VolumeReader;

/// Smallest header size accepted for a candidate file block.
const MIN_FILE_HEADER_SIZE: usize = 32;

/// Scan the volume from the reader's position (just past the 7-byte marker).
pub fn scan_volume(
    reader: &mut VolumeReader,
    window_len: usize,
    layout: NameLengthLayout,
) -> Result<FileBlock> {
    let window_offset = reader.position();
    let volume_len = reader.known_size();
    let window = reader.peek(window_len)?;
    let block = scan_window(window, window_offset, layout)?;
    Ok(block.clamp_to_volume(volume_len))
}

/// Find the first plausible file header in `window`, whose first byte sits
/// at `window_offset` within the volume.
pub fn scan_window(window: &[u8], window_offset: u64, layout: NameLengthLayout) -> Result<FileBlock> {
    check_encrypted_main(window)?;

    let mut search = 0;
    while let Some(rel) = window.get(search..).and_then(|rest| rest.iter().position(|&b| b == FILE_BLOCK)) {
        let type_pos = search + rel;
        search = type_pos + 1;
        let Some(header_start) = type_pos.checked_sub(2) else {
            continue;
        };
        if let Some(block) = candidate(window, header_start, window_offset, layout) {
            debug!(
                offset = block.header_offset,
                name = %block.name,
                "legacy scan matched file header"
            );
            return Ok(block);
        }
    }

    Err(RarError::NoFileHeader)
}

/// The main header follows the marker directly, or after one pad byte.
fn check_encrypted_main(window: &[u8]) -> Result<()> {
    for type_pos in [2, 3] {
        if window.get(type_pos) != Some(&MAIN_BLOCK) {
            continue;
        }
        if let Some(flags) = window.get(type_pos + 1..type_pos + 3) {
            if is_encrypted_main_flags(u16::from_le_bytes([flags[0], flags[1]])) {
                return Err(RarError::PasswordProtected);
            }
        }
    }
    Ok(())
}

fn candidate(
    window: &[u8],
    header_start: usize,
    window_offset: u64,
    layout: NameLengthLayout,
) -> Option<FileBlock> {
    let base = window.get(header_start..header_start + 7)?;
    let flags = u16::from_le_bytes([base[3], base[4]]);
    let size = usize::from(u16::from_le_bytes([base[5], base[6]]));
    if size < MIN_FILE_HEADER_SIZE {
        return None;
    }
    let header_end = header_start + size;
    let header = window.get(header_start..header_end)?;

    let fixed: &[u8; FIXED_SIZE] = header.get(7..7 + FIXED_SIZE)?.try_into().ok()?;
    let fields = FileHeaderFields::parse(fixed, layout);
    let mut offset = 7 + FIXED_SIZE;

    let (mut packed, mut unpacked) = (u64::from(fields.packed_size), u64::from(fields.unpacked_size));
    if flags & FILE_HIGH_SIZE != 0 {
        let high = header.get(offset..offset + 8)?;
        packed = wide_size(fields.packed_size, u32::from_le_bytes([high[0], high[1], high[2], high[3]]));
        unpacked = wide_size(fields.unpacked_size, u32::from_le_bytes([high[4], high[5], high[6], high[7]]));
        offset += 8;
    }

    let name_field = header.get(offset..offset + usize::from(fields.name_size))?;
    let name = if flags & FILE_UNICODE_NAME != 0 {
        decode_name_field(name_field)
    } else {
        String::from_utf8_lossy(name_field).into_owned()
    };
    trace!(at = header_start, flags, size, name = %name, "legacy candidate");

    let mut block = FileBlock::new(
        name,
        window_offset + header_start as u64,
        size as u64,
        packed,
        unpacked,
    );
    block.stored = fields.method == METHOD_STORE;
    block.encrypted = flags & FILE_ENCRYPTED != 0;
    block.continued |= flags & FILE_SPLIT_AFTER != 0;
    Some(block)
}
