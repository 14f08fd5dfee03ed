//! Random-access byte sources
//!
//! Every read path opens its own view of a file. A view is a [`ByteSource`]:
//! an immutable, thread-safe sequence of bytes with positional reads.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use bytes::Bytes;
use memmap2::Mmap;

use crate::{StorageError, StorageResult};

/// Immutable bytes supporting positional reads
pub trait ByteSource: Send + Sync {
    /// Total length in bytes
    fn len(&self) -> u64;

    /// Whether the source holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the complete contents
    fn as_slice(&self) -> &[u8];

    /// Copy up to `buf.len()` bytes starting at `offset`, returning the count
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        let data = self.as_slice();
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        if start >= data.len() {
            return 0;
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        n
    }

    /// Copy exactly `length` bytes starting at `offset`
    fn read_range(&self, offset: u64, length: u64) -> StorageResult<Vec<u8>> {
        let size = self.len();
        let end = offset.checked_add(length).filter(|end| *end <= size);
        let Some(end) = end else {
            return Err(StorageError::OutOfBounds {
                offset,
                length,
                size,
            });
        };
        Ok(self.as_slice()[offset as usize..end as usize].to_vec())
    }
}

/// Source backed by reference-counted bytes
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    data: Bytes,
}

impl BufferSource {
    /// Wrap existing bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// The underlying bytes
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl ByteSource for BufferSource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Source backed by a memory-mapped file
pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    /// Wrap an existing mapping
    pub fn new(mmap: Mmap) -> Self {
        Self { mmap }
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

/// `Read + Seek` adapter over a shared byte source
///
/// Lets the seekable header reader re-read the header region from offset 0.
pub struct SourceReader {
    source: Arc<dyn ByteSource>,
    position: u64,
}

impl SourceReader {
    /// Create a reader positioned at offset 0
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self {
            source,
            position: 0,
        }
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_at(self.position, buf);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.source.len().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            ));
        };
        self.position = target;
        Ok(target)
    }
}
