//! Cross-volume grouping of file blocks.
//!
//! A file split over several volumes shows up as one block per volume, all
//! carrying the same name. [`aggregate_files`] folds those blocks into one
//! [`AggregatedFile`] per name, keeping the parts in volume order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RarError, Result};
use crate::file_media::FileSystem;
use crate::indexer::IndexOptions;
use crate::orchestrator::index_volumes_parallel;
use crate::volume_index::VolumeIndex;

/// One volume's share of an aggregated file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AggregatedFilePart {
    pub path: PathBuf,
    pub data_offset: u64,
    /// Payload bytes present in this volume.
    pub packed_size: u64,
    pub unpacked_size: u64,
    pub stored: bool,
    pub encrypted: bool,
}

impl AggregatedFilePart {
    /// Offset one past the part's last payload byte.
    pub fn data_end(&self) -> u64 {
        self.data_offset.saturating_add(self.packed_size)
    }
}

/// A logical file reassembled from its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AggregatedFile {
    pub name: String,
    /// Sum of the parts' in-volume payload sizes.
    pub total_packed_size: u64,
    /// First non-zero unpacked size reported by a part.
    pub total_unpacked_size: u64,
    pub parts: Vec<AggregatedFilePart>,
    pub any_encrypted: bool,
    pub all_stored: bool,
}

impl AggregatedFile {
    fn new(name: String) -> Self {
        Self {
            name,
            total_packed_size: 0,
            total_unpacked_size: 0,
            parts: Vec::new(),
            any_encrypted: false,
            all_stored: true,
        }
    }

    fn push(&mut self, part: AggregatedFilePart) {
        self.total_packed_size = self.total_packed_size.saturating_add(part.packed_size);
        if self.total_unpacked_size == 0 {
            self.total_unpacked_size = part.unpacked_size;
        }
        self.any_encrypted |= part.encrypted;
        self.all_stored &= part.stored;
        self.parts.push(part);
    }
}

/// Group file blocks by name. `volumes` must be in volume order; names come
/// out in first-seen order and blocks with an empty name are skipped.
pub fn aggregate_files(volumes: &[VolumeIndex]) -> Vec<AggregatedFile> {
    let mut files: Vec<AggregatedFile> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();

    for volume in volumes {
        for block in &volume.file_blocks {
            if block.name.is_empty() {
                continue;
            }
            let slot = *by_name.entry(block.name.as_str()).or_insert_with(|| {
                files.push(AggregatedFile::new(block.name.clone()));
                files.len() - 1
            });
            files[slot].push(AggregatedFilePart {
                path: volume.path.clone(),
                data_offset: block.data_offset,
                packed_size: block.volume_data_size,
                unpacked_size: block.unpacked_size,
                stored: block.stored,
                encrypted: block.encrypted,
            });
        }
    }

    files
}

/// Fail on the first block, in volume order, that is encrypted or not stored.
pub fn validate_listing(volumes: &[VolumeIndex]) -> Result<()> {
    for volume in volumes {
        for block in &volume.file_blocks {
            let source = if block.encrypted {
                RarError::PasswordProtected
            } else if !block.stored {
                RarError::CompressedUnsupported
            } else {
                continue;
            };
            debug!(name = %block.name, path = %volume.path.display(), error = %source, "listing rejected");
            return Err(RarError::File {
                name: block.name.clone(),
                path: volume.path.clone(),
                source: Box::new(source),
            });
        }
    }
    Ok(())
}

/// Index `paths` concurrently, reject encrypted or compressed content, and
/// aggregate the rest.
pub fn list_files<F, P>(
    fs: &F,
    paths: &[P],
    workers: usize,
    options: &IndexOptions,
) -> Result<Vec<AggregatedFile>>
where
    F: FileSystem + ?Sized,
    P: AsRef<Path> + Sync,
{
    let volumes = index_volumes_parallel(fs, paths, workers, options)?;
    validate_listing(&volumes)?;
    Ok(aggregate_files(&volumes))
}

/// Where payload data starts in one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VolumeOffset {
    pub path: PathBuf,
    pub data_offset: u64,
    /// Name of the file this volume's data belongs to. A volume without a
    /// file header inherits the previous volume's name.
    pub file_name: String,
}

pub fn volume_offsets(volumes: &[VolumeIndex]) -> Vec<VolumeOffset> {
    let mut last_name = String::new();
    volumes
        .iter()
        .map(|volume| {
            if let Some(block) = volume.first_block().filter(|block| !block.name.is_empty()) {
                last_name.clone_from(&block.name);
            }
            VolumeOffset {
                path: volume.path.clone(),
                data_offset: volume.total_header_bytes,
                file_name: last_name.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FileEntry {
    pub name: String,
    pub data_offset: u64,
    /// Payload bytes present in the volume.
    pub packed_size: u64,
}

/// File entries of one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VolumeFiles {
    pub path: PathBuf,
    pub files: Vec<FileEntry>,
}

pub fn volume_files(volumes: &[VolumeIndex]) -> Vec<VolumeFiles> {
    volumes
        .iter()
        .map(|volume| VolumeFiles {
            path: volume.path.clone(),
            files: volume
                .file_blocks
                .iter()
                .map(|block| FileEntry {
                    name: block.name.clone(),
                    data_offset: block.data_offset,
                    packed_size: block.volume_data_size,
                })
                .collect(),
        })
        .collect()
}
