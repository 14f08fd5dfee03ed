//! Storage backends
//!
//! The read path needs three things from storage: a byte source per path,
//! the logical size of a file, and the whole blocks covering a byte window.
//! The write path needs to create objects.

mod local;
mod memory;

use std::sync::Arc;

use ocf_format::SyncToken;

use crate::StorageResult;
use crate::compression::FileCompression;
use crate::locator::{self, DEFAULT_SCAN_BUFFER};
use crate::source::{BufferSource, ByteSource};

pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Byte-range addressable storage
pub trait Storage: Send + Sync {
    /// Open an independent view of the object at `path`
    fn open(&self, path: &str) -> StorageResult<Arc<dyn ByteSource>>;

    /// Write a complete object, replacing any existing one
    fn create(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Physical size of the object at `path`
    fn logical_size(&self, path: &str) -> StorageResult<u64> {
        Ok(self.open(path)?.len())
    }

    /// Size of each read while scanning for sync tokens
    fn scan_buffer(&self) -> usize {
        DEFAULT_SCAN_BUFFER
    }

    /// Read the whole blocks covering `(offset, length)` of `source`
    fn read_range(
        &self,
        source: &dyn ByteSource,
        offset: u64,
        length: u64,
        sync: &SyncToken,
    ) -> StorageResult<Vec<u8>> {
        locator::read_block(source, offset, length, sync, self.scan_buffer())
    }

    /// Open `path`, removing a whole-file compression wrapper if given
    ///
    /// The returned source has the file's logical (decompressed) length.
    fn open_decoded(
        &self,
        path: &str,
        compression: Option<FileCompression>,
    ) -> StorageResult<Arc<dyn ByteSource>> {
        let source = self.open(path)?;
        match compression {
            None => Ok(source),
            Some(compression) => {
                let decoded = compression.decompress(source.as_slice())?;
                Ok(Arc::new(BufferSource::new(decoded)))
            }
        }
    }
}
