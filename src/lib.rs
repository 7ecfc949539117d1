//! Structural RAR header indexer.
//!
//! Locates the payload of every file inside a set of RAR volumes without
//! decompressing anything: which volume holds which bytes of which file, at
//! what offset. Built for serving stored (`-m0`) multi-volume archives as
//! plain byte ranges.
//!
//! Supports RAR15 (RAR 1.5-4.x) and RAR50 (RAR 5.0+) formats. Volumes whose
//! RAR 1.5-4.x block chain cannot be followed fall back to a tolerant scan
//! for the first file header.
//!
//! ## Features
//! - `serde` - Serialize/Deserialize for the index and listing types
//!
//! ## Example
//!
//! ```rust,no_run
//! use rar_index::{list_files, IndexOptions, LocalFileSystem};
//!
//! let volumes = ["movie.part1.rar", "movie.part2.rar"];
//! let files = list_files(&LocalFileSystem, &volumes, 0, &IndexOptions::default())?;
//! for file in &files {
//!     println!("{}: {} bytes in {} parts", file.name, file.total_packed_size, file.parts.len());
//! }
//! # Ok::<(), rar_index::RarError>(())
//! ```
//!
//! Diagnostics are emitted as `tracing` events; install a subscriber to see
//! them.

pub mod aggregate;
pub mod error;
mod file_media;
pub mod formats;
mod indexer;
mod inner_file;
mod orchestrator;
pub mod parsing;
pub mod volume_index;
pub mod volume_reader;

#[cfg(test)]
mod testutil;

pub use aggregate::{
    aggregate_files, list_files, validate_listing, volume_files, volume_offsets, AggregatedFile,
    AggregatedFilePart, FileEntry, VolumeFiles, VolumeOffset,
};
pub use error::{RarError, Result, VintError};
pub use file_media::{FileSystem, LocalFileSystem, MemoryFileSystem, ReadSeek, VolumeHandle};
pub use formats::{RarVersion, Signature};
pub use indexer::{index_volume, IndexOptions, DEFAULT_LEGACY_SCAN_WINDOW};
pub use inner_file::{PartMapEntry, StoredFileReader};
pub use orchestrator::{index_volumes, index_volumes_parallel, FirstError};
pub use parsing::NameLengthLayout;
pub use volume_index::{FileBlock, VolumeIndex};
