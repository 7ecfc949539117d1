//! StoredFileReader - the payload of a stored file as one byte stream.
//!
//! A stored file's bytes are its parts' payloads laid end to end. The reader
//! maps logical offsets to parts with a binary search and opens each volume
//! through the [`FileSystem`] when the read position enters it.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::aggregate::{AggregatedFile, AggregatedFilePart};
use crate::error::{RarError, Result};
use crate::file_media::FileSystem;
use crate::volume_reader::VolumeReader;

/// Logical byte range `[start, end)` covered by one part.
/// Stored sorted by start offset for binary search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartMapEntry {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug)]
struct OpenPart {
    index: usize,
    reader: VolumeReader,
}

/// `Read + Seek` over a stored, unencrypted [`AggregatedFile`].
#[derive(Debug)]
pub struct StoredFileReader<F> {
    fs: F,
    name: String,
    parts: Vec<AggregatedFilePart>,
    part_map: Vec<PartMapEntry>,
    length: u64,
    position: u64,
    open: Option<OpenPart>,
}

impl<F: FileSystem> StoredFileReader<F> {
    /// Fails with [`RarError::PasswordProtected`] or
    /// [`RarError::CompressedUnsupported`] (wrapped in [`RarError::File`])
    /// when a part cannot be read as plain bytes.
    pub fn new(fs: F, file: &AggregatedFile) -> Result<Self> {
        for part in &file.parts {
            let source = if part.encrypted {
                RarError::PasswordProtected
            } else if !part.stored {
                RarError::CompressedUnsupported
            } else {
                continue;
            };
            return Err(RarError::File {
                name: file.name.clone(),
                path: part.path.clone(),
                source: Box::new(source),
            });
        }

        let part_map = Self::calculate_part_map(&file.parts);
        let length = part_map.last().map_or(0, |entry| entry.end);
        Ok(Self {
            fs,
            name: file.name.clone(),
            parts: file.parts.clone(),
            part_map,
            length,
            position: 0,
            open: None,
        })
    }

    fn calculate_part_map(parts: &[AggregatedFilePart]) -> Vec<PartMapEntry> {
        let mut offset = 0u64;
        parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                let start = offset;
                offset += part.packed_size;
                PartMapEntry {
                    index,
                    start,
                    end: offset,
                }
            })
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total length in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part_entry(&self, index: usize) -> Option<&PartMapEntry> {
        self.part_map.get(index)
    }

    /// Part holding the byte at `offset`. Empty parts never match.
    pub fn find_part_index(&self, offset: u64) -> Option<usize> {
        if offset >= self.length {
            return None;
        }

        let idx = self.part_map.partition_point(|entry| entry.end <= offset);
        if idx < self.part_map.len() && self.part_map[idx].start <= offset {
            Some(idx)
        } else {
            None
        }
    }

    /// Position a reader on the volume byte matching `self.position`.
    fn reader_for(&mut self, index: usize) -> io::Result<&mut VolumeReader> {
        let part = &self.parts[index];
        let target = part.data_offset + (self.position - self.part_map[index].start);

        let reusable = match self.open.as_mut() {
            Some(open) if open.index == index => open.reader.seek_to(target)?,
            _ => false,
        };
        if !reusable {
            trace!(path = %part.path.display(), offset = target, "opening part");
            let handle = self.fs.open(&part.path)?;
            let mut reader = VolumeReader::new(handle, None);
            reader.skip(target)?;
            self.open = Some(OpenPart { index, reader });
        }

        match self.open.as_mut() {
            Some(open) => Ok(&mut open.reader),
            None => Err(io::Error::other("part reader missing")),
        }
    }
}

impl<F: FileSystem> Read for StoredFileReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(index) = self.find_part_index(self.position) else {
            return Ok(0);
        };

        let left_in_part = self.part_map[index].end - self.position;
        let want = buf.len().min(usize::try_from(left_in_part).unwrap_or(usize::MAX));
        let reader = self.reader_for(index)?;
        let available = reader.peek(want)?;
        if available.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "volume ended before the part's payload",
            ));
        }
        let read = available.len();
        buf[..read].copy_from_slice(available);
        reader.consume(read);
        self.position += read as u64;
        Ok(read)
    }
}

impl<F: FileSystem> Seek for StoredFileReader<F> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            ));
        };
        if target > self.length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                RarError::InvalidOffset {
                    offset: target,
                    length: self.length,
                },
            ));
        }
        self.position = target;
        Ok(target)
    }
}
