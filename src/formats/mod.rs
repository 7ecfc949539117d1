//! RAR format detection and signatures.
//!
//! A volume may carry arbitrary bytes before its signature (a self-extracting
//! stub, for instance), so detection scans a window instead of testing the
//! first bytes only.

use std::fmt;

/// Number of leading bytes searched for a signature.
pub const SIGNATURE_SCAN_WINDOW: usize = 1024;

/// Archive format of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RarVersion {
    /// RAR 1.5 to 4.x block layout (fixed-width fields).
    Rar4,
    /// RAR 5.0+ block layout (varint fields).
    Rar5,
    #[default]
    Unknown,
}

impl fmt::Display for RarVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rar4 => write!(f, "RAR3"),
            Self::Rar5 => write!(f, "RAR5"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// RAR file signature detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// RAR 1.5 to 4.x
    Rar15,
    /// RAR 5.0+
    Rar50,
}

impl Signature {
    pub const RAR15: &[u8; 7] = b"Rar!\x1a\x07\x00";
    pub const RAR50: &[u8; 8] = b"Rar!\x1a\x07\x01\x00";

    pub fn size(&self) -> u64 {
        match self {
            Self::Rar15 => 7,
            Self::Rar50 => 8,
        }
    }

    pub fn version(&self) -> RarVersion {
        match self {
            Self::Rar15 => RarVersion::Rar4,
            Self::Rar50 => RarVersion::Rar5,
        }
    }

    /// Match a signature at the very start of `data`.
    ///
    /// The RAR5 signature shares its first six bytes with RAR4, so the longer
    /// pattern is tested first.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(Self::RAR50) {
            Some(Self::Rar50)
        } else if data.starts_with(Self::RAR15) {
            Some(Self::Rar15)
        } else {
            None
        }
    }

    /// Scan `window` left to right and return the first signature with its
    /// offset. Only the first [`SIGNATURE_SCAN_WINDOW`] bytes are examined.
    pub fn find(window: &[u8]) -> Option<(Self, usize)> {
        let window = &window[..window.len().min(SIGNATURE_SCAN_WINDOW)];
        // Each candidate must start with the shared "Rar!" prefix.
        let mut start = 0;
        while start < window.len() {
            let rel = window[start..].iter().position(|&b| b == b'R')?;
            let offset = start + rel;
            if let Some(sig) = Self::from_bytes(&window[offset..]) {
                return Some((sig, offset));
            }
            start = offset + 1;
        }
        None
    }
}
