//! Error types for RAR header indexing.
//!
//! This module provides the [`RarError`] type which covers every failure the
//! indexer can report while detecting, parsing and listing RAR volumes.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`SignatureNotFound`], [`UnsupportedVersion`] | Volume is not a recognizable RAR archive |
//! | Encryption | [`PasswordProtected`] | Header or payload encryption detected |
//! | Listing | [`CompressedUnsupported`] | A file's payload is not stored |
//! | Structure | [`SuspiciousHeaderSize`], [`ExtraAreaOverflow`], [`InvalidNameLength`], [`TruncatedField`], [`MalformedField`], [`InvalidBlockSize`], [`NoFileHeader`] | Header chain cannot be decoded |
//! | Context | [`Volume`], [`File`] | Wraps another error with the offending path or file name |
//! | I/O | [`Io`], [`InvalidOffset`] | Read/seek errors |
//!
//! ## Example
//!
//! ```rust,ignore
//! use rar_index::{list_files, LocalFileSystem, IndexOptions};
//!
//! match list_files(&LocalFileSystem, &volumes, 0, &IndexOptions::default()) {
//!     Ok(files) => println!("Found {} files", files.len()),
//!     Err(e) if e.is_password_protected() => eprintln!("Archive is encrypted"),
//!     Err(e) if e.is_compressed_unsupported() => eprintln!("Archive is compressed"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! [`SignatureNotFound`]: RarError::SignatureNotFound
//! [`UnsupportedVersion`]: RarError::UnsupportedVersion
//! [`PasswordProtected`]: RarError::PasswordProtected
//! [`CompressedUnsupported`]: RarError::CompressedUnsupported
//! [`SuspiciousHeaderSize`]: RarError::SuspiciousHeaderSize
//! [`ExtraAreaOverflow`]: RarError::ExtraAreaOverflow
//! [`InvalidNameLength`]: RarError::InvalidNameLength
//! [`TruncatedField`]: RarError::TruncatedField
//! [`MalformedField`]: RarError::MalformedField
//! [`InvalidBlockSize`]: RarError::InvalidBlockSize
//! [`NoFileHeader`]: RarError::NoFileHeader
//! [`Volume`]: RarError::Volume
//! [`File`]: RarError::File
//! [`Io`]: RarError::Io
//! [`InvalidOffset`]: RarError::InvalidOffset

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to decode a variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VintError {
    /// The source was exhausted before any byte was consumed.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// The 10-byte cap was reached with the continuation bit still set, or
    /// the input ended in the middle of a sequence.
    #[error("varint too long or truncated")]
    TooLong,
}

/// Error type for RAR indexing operations.
///
/// Volume-level errors are wrapped in [`RarError::Volume`] before they reach
/// the caller; use [`RarError::root`] (or the `is_*` helpers) to classify the
/// underlying condition.
///
/// # Example
///
/// ```rust,ignore
/// use rar_index::RarError;
///
/// fn handle_error(err: &RarError) {
///     match err.root() {
///         RarError::SignatureNotFound => {
///             // No `Rar!` marker in the first KiB
///         }
///         RarError::PasswordProtected => {
///             // Headers or payload are encrypted
///         }
///         RarError::Io(io_err) => {
///             // Underlying I/O error (file not found, permission denied, etc.)
///         }
///         _ => {}
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum RarError {
    /// No RAR signature in the initial 1 KiB scan window.
    ///
    /// RAR volumes carry either:
    /// - RAR 1.5-4.x: `Rar!\x1a\x07\x00`
    /// - RAR 5.0+: `Rar!\x1a\x07\x01\x00`
    #[error("RAR signature not found in first 1KB")]
    SignatureNotFound,

    /// A signature matched neither recognized format.
    #[error("unsupported/unknown archive version")]
    UnsupportedVersion,

    /// Header-level or file-level encryption was detected.
    ///
    /// Never retried and never falls through to legacy scanning.
    #[error("password protected")]
    PasswordProtected,

    /// A file's payload is compressed. Only reported by the listing operation.
    #[error("compressed file unsupported")]
    CompressedUnsupported,

    /// A RAR5 header declared a length above the sanity ceiling.
    #[error("suspicious header size {size} at offset {offset}")]
    SuspiciousHeaderSize {
        /// Declared header length.
        size: u64,
        /// Offset of the block start.
        offset: u64,
    },

    /// A RAR5 extra area is larger than the header bytes left for it.
    #[error("extra area size {extra} exceeds remaining header bytes {available}")]
    ExtraAreaOverflow {
        /// Declared extra area size.
        extra: u64,
        /// Header bytes left after the common fields.
        available: u64,
    },

    /// A file name length of zero, or one that runs past its header.
    #[error("invalid name length {length} ({available} bytes available)")]
    InvalidNameLength {
        /// Declared name length.
        length: u64,
        /// Bytes left in the header for the name.
        available: usize,
    },

    /// An optional fixed-size field announced by a flag is cut short.
    #[error("{field} truncated at offset {offset}")]
    TruncatedField {
        /// Name of the missing field.
        field: &'static str,
        /// Offset of the header holding the field.
        offset: u64,
    },

    /// A variable-length field could not be decoded.
    #[error("malformed {field}: {source}")]
    MalformedField {
        /// Name of the field being decoded.
        field: &'static str,
        /// Underlying varint failure.
        #[source]
        source: VintError,
    },

    /// A RAR4 block declared a size smaller than its own header.
    #[error("invalid block size {size} at offset {offset}")]
    InvalidBlockSize {
        /// Declared block size.
        size: u64,
        /// Offset of the block start.
        offset: u64,
    },

    /// The legacy scanner found no plausible file header in its window.
    #[error("legacy scan: no file header found")]
    NoFileHeader,

    /// An invalid file offset was requested.
    ///
    /// This occurs when seeking beyond the end of a stored file.
    #[error("invalid offset: {offset} (file length: {length})")]
    InvalidOffset {
        /// The requested offset.
        offset: u64,
        /// The actual file length.
        length: u64,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An error raised while indexing a specific volume.
    #[error("{}: {source}", .path.display())]
    Volume {
        /// The volume path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<RarError>,
    },

    /// An error attributed to one file inside a volume.
    #[error("{source}: {name} ({})", .path.display())]
    File {
        /// Name of the file inside the archive.
        name: String,
        /// The volume holding the offending part.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<RarError>,
    },
}

impl RarError {
    /// Wrap this error with the volume path it came from.
    pub fn in_volume(self, path: impl Into<PathBuf>) -> Self {
        Self::Volume {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`RarError::Volume`] and
    /// [`RarError::File`] wrappers.
    pub fn root(&self) -> &RarError {
        let mut current = self;
        loop {
            match current {
                Self::Volume { source, .. } | Self::File { source, .. } => current = source,
                other => return other,
            }
        }
    }

    /// The volume path attached to this error, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Volume { path, .. } | Self::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_password_protected(&self) -> bool {
        matches!(self.root(), Self::PasswordProtected)
    }

    pub fn is_compressed_unsupported(&self) -> bool {
        matches!(self.root(), Self::CompressedUnsupported)
    }

    /// A field-tagged varint failure.
    pub(crate) fn field(field: &'static str) -> impl FnOnce(VintError) -> Self {
        move |source| Self::MalformedField { field, source }
    }
}

pub type Result<T> = std::result::Result<T, RarError>;
