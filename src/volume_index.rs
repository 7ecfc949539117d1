//! Per-volume index produced by the parsers.

use std::path::PathBuf;

use crate::formats::RarVersion;

/// One file header found inside a volume.
///
/// `data_offset` always equals `header_offset + header_len`, and
/// `volume_data_size` never reaches past the end of the owning volume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FileBlock {
    /// Decoded file name.
    pub name: String,
    /// Offset of the block's first byte within the volume.
    pub header_offset: u64,
    /// Full header length, from the block's first byte to its payload.
    pub header_len: u64,
    /// Offset of the first payload byte within the volume.
    pub data_offset: u64,
    /// Declared payload size.
    pub packed_size: u64,
    /// Declared original size; 0 when unknown.
    pub unpacked_size: u64,
    /// Payload bytes actually present in this volume.
    pub volume_data_size: u64,
    /// Payload is the literal file content.
    pub stored: bool,
    /// The file likely continues in a later volume.
    pub continued: bool,
    pub encrypted: bool,
}

impl FileBlock {
    pub(crate) fn new(
        name: String,
        header_offset: u64,
        header_len: u64,
        packed_size: u64,
        unpacked_size: u64,
    ) -> Self {
        Self {
            name,
            header_offset,
            header_len,
            data_offset: header_offset + header_len,
            packed_size,
            unpacked_size,
            volume_data_size: packed_size,
            stored: false,
            continued: unpacked_size > packed_size,
            encrypted: false,
        }
    }

    /// Limit the payload to what the volume actually holds. An unknown
    /// volume size leaves the declared size in place.
    pub(crate) fn clamp_to_volume(mut self, volume_len: Option<u64>) -> Self {
        if let Some(len) = volume_len {
            let available = len.saturating_sub(self.data_offset);
            self.volume_data_size = self.packed_size.min(available);
        }
        self
    }

    /// Offset one past the last payload byte in this volume.
    pub fn data_end(&self) -> u64 {
        self.data_offset.saturating_add(self.volume_data_size)
    }
}

/// Header index of one physical volume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VolumeIndex {
    pub path: PathBuf,
    pub format: RarVersion,
    /// Data offset of the first file block, or 0 when none was found.
    pub total_header_bytes: u64,
    pub file_blocks: Vec<FileBlock>,
}

impl VolumeIndex {
    pub fn new(path: impl Into<PathBuf>, format: RarVersion, file_blocks: Vec<FileBlock>) -> Self {
        Self {
            path: path.into(),
            format,
            total_header_bytes: file_blocks.first().map_or(0, |block| block.data_offset),
            file_blocks,
        }
    }

    pub fn first_block(&self) -> Option<&FileBlock> {
        self.file_blocks.first()
    }
}
