//! Positioned, peekable reader over a [`VolumeHandle`].
//!
//! Parsers need three things a plain `BufReader` does not give them: the
//! absolute offset of the next byte, a look-ahead window of a requested size,
//! and a skip that seeks when the handle can and discards when it cannot.

use std::io::{self, Read, SeekFrom};

use crate::file_media::VolumeHandle;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug)]
pub struct VolumeReader {
    handle: VolumeHandle,
    buf: Vec<u8>,
    /// Index of the next unread byte in `buf`.
    cursor: usize,
    /// Absolute offset of the next unread byte.
    position: u64,
    len: Option<u64>,
}

impl VolumeReader {
    pub fn new(handle: VolumeHandle, len: Option<u64>) -> Self {
        Self {
            handle,
            buf: Vec::new(),
            cursor: 0,
            position: 0,
            len,
        }
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Volume size, when known.
    pub fn known_size(&self) -> Option<u64> {
        self.len
    }

    /// Bytes read ahead but not consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Look at up to `n` upcoming bytes without consuming them. The returned
    /// slice is shorter than `n` only at end of input.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        if self.buffered() < n {
            self.fill(n)?;
        }
        let end = self.cursor + n.min(self.buffered());
        Ok(&self.buf[self.cursor..end])
    }

    fn fill(&mut self, n: usize) -> io::Result<()> {
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        while self.buf.len() < n {
            let old = self.buf.len();
            let want = (n - old).max(READ_CHUNK);
            self.buf.resize(old + want, 0);
            let read = loop {
                match self.handle.read(&mut self.buf[old..]) {
                    Ok(read) => break read,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        self.buf.truncate(old);
                        return Err(e);
                    }
                }
            };
            self.buf.truncate(old + read);
            if read == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Mark `n` peeked bytes as read.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buffered());
        self.cursor += n;
        self.position += n as u64;
    }

    /// Fill `out` completely, or fail with `UnexpectedEof`.
    pub fn read_exact(&mut self, out: &mut [u8]) -> io::Result<()> {
        let position = self.position;
        let available = self.peek(out.len())?;
        if available.len() < out.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "needed {} bytes at offset {}, got {}",
                    out.len(),
                    position,
                    available.len()
                ),
            ));
        }
        out.copy_from_slice(available);
        self.consume(out.len());
        Ok(())
    }

    /// Like [`read_exact`](Self::read_exact), but a clean end of input (no
    /// byte available at all) returns `Ok(false)` instead of an error.
    pub fn read_exact_or_eof(&mut self, out: &mut [u8]) -> io::Result<bool> {
        if self.peek(1)?.is_empty() {
            return Ok(false);
        }
        self.read_exact(out)?;
        Ok(true)
    }

    pub fn read_vec(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.read_exact(&mut out)?;
        Ok(out)
    }


    /// Advance `n` bytes. Buffered bytes are dropped first; the remainder is
    /// skipped with a seek when the handle supports it, otherwise by reading
    /// and discarding. Skipping past a known volume size fails with
    /// `UnexpectedEof` whichever way the handle moves.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        if let Some(len) = self.len {
            if self.position.checked_add(n).map_or(true, |end| end > len) {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("skip of {} bytes at offset {} passes end of volume ({})", n, self.position, len),
                ));
            }
        }
        let from_buffer = n.min(self.buffered() as u64) as usize;
        self.consume(from_buffer);
        let mut remaining = n - from_buffer as u64;
        if remaining == 0 {
            return Ok(());
        }

        if let Ok(delta) = i64::try_from(remaining) {
            if let Some(Ok(_)) = self.handle.try_seek(SeekFrom::Current(delta)) {
                self.position += remaining;
                return Ok(());
            }
        }

        let copied = io::copy(&mut (&mut self.handle).take(remaining), &mut io::sink())?;
        self.position += copied;
        remaining -= copied;
        if remaining > 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} bytes short while skipping", remaining),
            ));
        }
        Ok(())
    }

    /// Reposition at `offset`. Forward moves always succeed (by skipping);
    /// backward moves need a seekable handle. Returns `Ok(false)` when the
    /// handle cannot rewind that far.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<bool> {
        if offset >= self.position {
            self.skip(offset - self.position)?;
            return Ok(true);
        }

        // Still inside the read-ahead buffer.
        let back = self.position - offset;
        if back <= self.cursor as u64 {
            self.cursor -= back as usize;
            self.position = offset;
            return Ok(true);
        }

        match self.handle.try_seek(SeekFrom::Start(offset)) {
            Some(result) => {
                result?;
                self.buf.clear();
                self.cursor = 0;
                self.position = offset;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn seekable(data: &[u8]) -> VolumeReader {
        VolumeReader::new(
            VolumeHandle::seekable(Cursor::new(data.to_vec())),
            Some(data.len() as u64),
        )
    }

    fn sequential(data: &[u8]) -> VolumeReader {
        VolumeReader::new(VolumeHandle::sequential(Cursor::new(data.to_vec())), None)
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = seekable(b"abcdef");
        assert_eq!(reader.peek(3).unwrap(), b"abc");
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.peek(100).unwrap(), b"abcdef");
        reader.consume(2);
        assert_eq!(reader.peek(2).unwrap(), b"cd");
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_read_exact_or_eof() {
        let mut reader = seekable(b"abcd");
        let mut buf = [0u8; 4];
        assert!(reader.read_exact_or_eof(&mut buf).unwrap());
        assert_eq!(&buf, b"abcd");
        assert!(!reader.read_exact_or_eof(&mut buf).unwrap());
    }

    #[test]
    fn test_partial_read_is_error() {
        let mut reader = seekable(b"ab");
        let mut buf = [0u8; 4];
        let err = reader.read_exact_or_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_skip_seekable_and_sequential() {
        let data: Vec<u8> = (0..=255u8).cycle().take(40_000).collect();
        for mut reader in [seekable(&data), sequential(&data)] {
            reader.peek(10).unwrap();
            reader.skip(30_000).unwrap();
            assert_eq!(reader.position(), 30_000);
            assert_eq!(reader.peek(1).unwrap(), &data[30_000..30_001]);
        }
    }

    #[test]
    fn test_skip_past_end_sequential_fails() {
        let mut reader = sequential(b"abc");
        let err = reader.skip(10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_skip_past_known_size_fails() {
        let mut reader = seekable(b"abcdef");
        reader.skip(6).unwrap();
        assert_eq!(reader.position(), 6);

        let mut reader = seekable(b"abcdef");
        reader.skip(2).unwrap();
        let err = reader.skip(5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.skip(u64::MAX).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_seek_to_backward() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut reader = seekable(&data);
        reader.skip(50).unwrap();
        assert!(reader.seek_to(10).unwrap());
        assert_eq!(reader.peek(1).unwrap(), &[10]);

        let mut reader = sequential(&data);
        reader.peek(20).unwrap();
        reader.consume(15);
        // Within the buffer: fine even without seeking.
        assert!(reader.seek_to(5).unwrap());
        assert_eq!(reader.peek(1).unwrap(), &[5]);
    }

    #[test]
    fn test_seek_to_backward_sequential_beyond_buffer() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut reader = sequential(&data);
        reader.peek(4).unwrap();
        reader.consume(4);
        // Asking for more than is buffered compacts the consumed bytes away.
        reader.peek(200).unwrap();
        assert!(!reader.seek_to(0).unwrap());
    }
}
