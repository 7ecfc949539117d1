//! Per-volume indexing: open, detect the signature, dispatch to a parser.
//!
//! A RAR 1.5-4.x volume gets two attempts. The strict block chain parser
//! runs first; if it fails (for any reason but encryption) or finds no file
//! block, the legacy scanner runs over the same volume from just past the
//! marker.

use std::path::Path;

use tracing::{debug, debug_span};

use crate::error::{RarError, Result};
use crate::file_media::FileSystem;
use crate::formats::{RarVersion, Signature, SIGNATURE_SCAN_WINDOW};
use crate::parsing::file_header::NameLengthLayout;
use crate::parsing::{legacy, rar4, rar5};
use crate::volume_index::{FileBlock, VolumeIndex};
use crate::volume_reader::VolumeReader;

/// Default read-ahead window of the legacy scanner.
pub const DEFAULT_LEGACY_SCAN_WINDOW: usize = 64 * 1024;

/// Parser options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Name length position in RAR 1.5-4.x file headers. Applies to both the
    /// strict parser and the legacy scanner.
    pub name_length_layout: NameLengthLayout,
    /// Treat RAR 1.5-4.x method byte `0x81` as stored.
    pub solid_store_heuristic: bool,
    /// Bytes examined by the legacy scanner.
    pub legacy_scan_window: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            name_length_layout: NameLengthLayout::Canonical,
            solid_store_heuristic: true,
            legacy_scan_window: DEFAULT_LEGACY_SCAN_WINDOW,
        }
    }
}

/// Index one volume. Errors come back wrapped in [`RarError::Volume`].
pub fn index_volume<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    options: &IndexOptions,
) -> Result<VolumeIndex> {
    let span = debug_span!("index_volume", path = %path.display());
    let _enter = span.enter();

    index(fs, path, options).map_err(|err| {
        debug!(error = %err, "indexing failed");
        err.in_volume(path)
    })
}

fn open_reader<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<VolumeReader> {
    let handle = fs.open(path)?;
    // An unknown size only disables the end-of-volume checks.
    let len = fs.size(path).ok();
    Ok(VolumeReader::new(handle, len))
}

fn index<F: FileSystem + ?Sized>(fs: &F, path: &Path, options: &IndexOptions) -> Result<VolumeIndex> {
    let mut reader = open_reader(fs, path)?;

    let window = reader.peek(SIGNATURE_SCAN_WINDOW)?;
    let (signature, sig_offset) = Signature::find(window).ok_or(RarError::SignatureNotFound)?;
    let version = signature.version();
    debug!(%version, offset = sig_offset, "signature found");
    reader.skip(sig_offset as u64)?;

    let blocks = match version {
        RarVersion::Rar4 => index_rar4(fs, path, &mut reader, sig_offset as u64, options)?,
        RarVersion::Rar5 => rar5::parse_volume(&mut reader)?,
        RarVersion::Unknown => return Err(RarError::UnsupportedVersion),
    };
    debug!(files = blocks.len(), "volume indexed");

    Ok(VolumeIndex::new(path, version, blocks))
}

fn index_rar4<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    reader: &mut VolumeReader,
    sig_offset: u64,
    options: &IndexOptions,
) -> Result<Vec<FileBlock>> {
    match rar4::parse_volume(reader, options) {
        Ok(blocks) if !blocks.is_empty() => Ok(blocks),
        Ok(_) => {
            debug!("no file block in header chain, trying legacy scan");
            Ok(vec![legacy_scan(fs, path, reader, sig_offset, options)?])
        }
        Err(RarError::PasswordProtected) => Err(RarError::PasswordProtected),
        Err(err) => {
            debug!(error = %err, "strict parse failed, trying legacy scan");
            match legacy_scan(fs, path, reader, sig_offset, options) {
                Ok(block) => Ok(vec![block]),
                Err(legacy_err) => {
                    debug!(error = %legacy_err, "legacy scan failed");
                    Err(err)
                }
            }
        }
    }
}

/// Rewind to just past the marker, reopening the volume when the handle
/// cannot seek back, and run the legacy scanner.
fn legacy_scan<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    reader: &mut VolumeReader,
    sig_offset: u64,
    options: &IndexOptions,
) -> Result<FileBlock> {
    let start = sig_offset + Signature::Rar15.size();
    if !reader.seek_to(start)? {
        let mut fresh = open_reader(fs, path)?;
        fresh.skip(start)?;
        *reader = fresh;
    }
    legacy::scan_volume(reader, options.legacy_scan_window, options.name_length_layout)
}
