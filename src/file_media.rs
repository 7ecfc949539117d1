//! File-system capability used to open RAR volumes.
//!
//! The indexer needs three things from its environment: open a volume for
//! buffered sequential reads, optionally seek within it, and learn its size.
//! Seeking is a capability of the opened handle rather than a requirement:
//! a [`VolumeHandle::Sequential`] source is parsed correctly by discarding
//! bytes instead of seeking over them.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Object-safe `Read + Seek`.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// An opened volume.
pub enum VolumeHandle {
    /// Supports efficient random access.
    Seekable(Box<dyn ReadSeek>),
    /// Forward-only byte stream.
    Sequential(Box<dyn Read + Send>),
}

impl VolumeHandle {
    pub fn seekable(inner: impl Read + Seek + Send + 'static) -> Self {
        Self::Seekable(Box::new(inner))
    }

    pub fn sequential(inner: impl Read + Send + 'static) -> Self {
        Self::Sequential(Box::new(inner))
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self, Self::Seekable(_))
    }

    /// Seek if the handle supports it; `None` for sequential handles.
    pub fn try_seek(&mut self, pos: SeekFrom) -> Option<io::Result<u64>> {
        match self {
            Self::Seekable(inner) => Some(inner.seek(pos)),
            Self::Sequential(_) => None,
        }
    }
}

impl Read for VolumeHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Seekable(inner) => inner.read(buf),
            Self::Sequential(inner) => inner.read(buf),
        }
    }
}

impl fmt::Debug for VolumeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seekable(_) => f.write_str("VolumeHandle::Seekable"),
            Self::Sequential(_) => f.write_str("VolumeHandle::Sequential"),
        }
    }
}

/// Minimal file-system operations needed to index volumes.
///
/// Implement this trait for custom byte sources (e.g., network streams or
/// in-memory fixtures). The library provides [`LocalFileSystem`] and
/// [`MemoryFileSystem`].
pub trait FileSystem: Send + Sync {
    /// Open `path` for reading.
    fn open(&self, path: &Path) -> io::Result<VolumeHandle>;

    /// Size of `path` in bytes.
    fn size(&self, path: &Path) -> io::Result<u64>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn open(&self, path: &Path) -> io::Result<VolumeHandle> {
        (**self).open(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        (**self).size(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    fn open(&self, path: &Path) -> io::Result<VolumeHandle> {
        (**self).open(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        (**self).size(path)
    }
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn open(&self, path: &Path) -> io::Result<VolumeHandle> {
        Ok(VolumeHandle::seekable(std::fs::File::open(path)?))
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// In-memory volumes keyed by path.
///
/// Handles are seekable unless the file system was created with
/// [`MemoryFileSystem::sequential`], which models streamed sources.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<PathBuf, Arc<[u8]>>,
    sequential: bool,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file system whose handles cannot seek.
    pub fn sequential() -> Self {
        Self {
            files: HashMap::new(),
            sequential: true,
        }
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), Arc::from(data.into()));
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    fn get(&self, path: &Path) -> io::Result<&Arc<[u8]>> {
        self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file", path.display()),
            )
        })
    }
}

impl FileSystem for MemoryFileSystem {
    fn open(&self, path: &Path) -> io::Result<VolumeHandle> {
        let cursor = Cursor::new(Arc::clone(self.get(path)?));
        if self.sequential {
            Ok(VolumeHandle::sequential(cursor))
        } else {
            Ok(VolumeHandle::seekable(cursor))
        }
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(self.get(path)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_seekable() {
        let fs = MemoryFileSystem::new().with_file("a.rar", b"hello".to_vec());
        let mut handle = fs.open(Path::new("a.rar")).unwrap();
        assert!(handle.is_seekable());
        assert_eq!(handle.try_seek(SeekFrom::Start(1)).unwrap().unwrap(), 1);
        let mut out = String::new();
        handle.read_to_string(&mut out).unwrap();
        assert_eq!(out, "ello");
        assert_eq!(fs.size(Path::new("a.rar")).unwrap(), 5);
    }

    #[test]
    fn test_memory_fs_sequential() {
        let fs = MemoryFileSystem::sequential().with_file("a.rar", b"hello".to_vec());
        let mut handle = fs.open(Path::new("a.rar")).unwrap();
        assert!(!handle.is_seekable());
        assert!(handle.try_seek(SeekFrom::Start(1)).is_none());
    }

    #[test]
    fn test_memory_fs_missing() {
        let fs = MemoryFileSystem::new();
        let err = fs.open(Path::new("missing.rar")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_local_fs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.rar");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(LocalFileSystem.size(&path).unwrap(), 3);
        assert!(LocalFileSystem.open(&path).unwrap().is_seekable());
    }
}
