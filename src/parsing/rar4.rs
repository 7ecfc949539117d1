//! RAR 1.5-4.x block chain parser.
//!
//! Walks blocks from the signature up to the first file block and reports
//! where that file's payload starts. Later blocks are never read.

use tracing::{debug, trace};

use super::block_header::{BlockHeader, END_BLOCK, FILE_BLOCK, MAIN_BLOCK};
use super::file_header::{
    is_stored, printable_name, wide_size, FileHeaderFields, FILE_ENCRYPTED, FILE_HIGH_SIZE,
    FILE_SALT, FILE_SPLIT_AFTER, FILE_UNICODE_NAME, FIXED_SIZE,
};
use super::unicode_name::decode_name_field;
use crate::error::{RarError, Result};
use crate::formats::Signature;
use crate::indexer::IndexOptions;
use crate::volume_index::FileBlock;
use crate::volume_reader::VolumeReader;

/// Parse a RAR 1.5-4.x volume. `reader` must be positioned on the signature.
///
/// Returns at most one file block. An encrypted main header fails with
/// [`RarError::PasswordProtected`].
pub fn parse_volume(reader: &mut VolumeReader, options: &IndexOptions) -> Result<Vec<FileBlock>> {
    reader.skip(Signature::Rar15.size())?;
    skip_alignment_pad(reader)?;
    let volume_len = reader.known_size();
    let mut blocks = Vec::new();

    loop {
        let header_offset = reader.position();
        let Some(header) = BlockHeader::read(reader)? else {
            break;
        };
        if usize::from(header.size) < BlockHeader::BASE_SIZE {
            return Err(RarError::InvalidBlockSize {
                size: u64::from(header.size),
                offset: header_offset,
            });
        }
        trace!(
            offset = header_offset,
            block_type = header.header_type,
            flags = header.flags,
            size = header.total_size(),
            "rar4 block"
        );

        match header.header_type {
            MAIN_BLOCK if header.is_encrypted_main() => {
                debug!(flags = header.flags, "encrypted main header");
                return Err(RarError::PasswordProtected);
            }
            FILE_BLOCK => {
                let block = read_file_block(reader, &header, header_offset, options)?
                    .clamp_to_volume(volume_len);
                blocks.push(block);
                break;
            }
            END_BLOCK => break,
            _ => {}
        }

        reader.skip(header.total_size().saturating_sub(header.encoded_len()))?;
    }

    Ok(blocks)
}

/// Some writers emit an extra zero byte after the 7-byte marker. Skip it
/// when the next bytes do not already look like a main or file block.
fn skip_alignment_pad(reader: &mut VolumeReader) -> Result<()> {
    let next = reader.peek(3)?;
    if next.len() == 3 && next[2] != MAIN_BLOCK && next[2] != FILE_BLOCK && next[0] == 0 {
        trace!(offset = reader.position(), "skipping pad byte after marker");
        reader.consume(1);
    }
    Ok(())
}

fn read_file_block(
    reader: &mut VolumeReader,
    header: &BlockHeader,
    header_offset: u64,
    options: &IndexOptions,
) -> Result<FileBlock> {
    let mut fixed = [0u8; FIXED_SIZE];
    reader.read_exact(&mut fixed)?;
    let fields = FileHeaderFields::parse(&fixed, options.name_length_layout);
    let mut header_len = header.encoded_len() + FIXED_SIZE as u64;

    let (mut packed, mut unpacked) = (u64::from(fields.packed_size), u64::from(fields.unpacked_size));
    if header.flags & FILE_HIGH_SIZE != 0 {
        let mut high = [0u8; 8];
        reader.read_exact(&mut high)?;
        packed = wide_size(fields.packed_size, u32::from_le_bytes([high[0], high[1], high[2], high[3]]));
        unpacked = wide_size(fields.unpacked_size, u32::from_le_bytes([high[4], high[5], high[6], high[7]]));
        header_len += 8;
    }

    let raw_name = reader.read_vec(usize::from(fields.name_size))?;
    header_len += u64::from(fields.name_size);
    let name = if header.flags & FILE_UNICODE_NAME != 0 {
        decode_name_field(&raw_name)
    } else {
        printable_name(&raw_name)
    };

    if header.flags & FILE_SALT != 0 {
        reader.skip(8)?;
        header_len += 8;
    }

    let mut block = FileBlock::new(name, header_offset, header_len, packed, unpacked);
    block.stored = is_stored(packed, unpacked, fields.method, options.solid_store_heuristic);
    block.encrypted = header.flags & FILE_ENCRYPTED != 0;
    block.continued |= header.flags & FILE_SPLIT_AFTER != 0;
    trace!(
        name = %block.name,
        method = fields.method,
        packed,
        unpacked,
        stored = block.stored,
        "rar4 file"
    );
    Ok(block)
}
