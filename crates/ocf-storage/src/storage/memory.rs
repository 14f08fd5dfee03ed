//! In-memory storage for tests and embedding

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::trace;

use super::Storage;
use crate::locator::DEFAULT_SCAN_BUFFER;
use crate::source::{BufferSource, ByteSource};
use crate::{StorageError, StorageResult};

/// Named objects held in memory
#[derive(Debug)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Bytes>>,
    scan_buffer: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            scan_buffer: DEFAULT_SCAN_BUFFER,
        }
    }

    /// Set the size of each sync scanning read
    #[must_use]
    pub const fn with_scan_buffer(mut self, scan_buffer: usize) -> Self {
        self.scan_buffer = scan_buffer;
        self
    }

    /// Insert or replace an object
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects.write().insert(path.into(), data.into());
    }

    /// Fetch an object's bytes
    pub fn get(&self, path: &str) -> Option<Bytes> {
        self.objects.read().get(path).cloned()
    }

    /// Names of all stored objects, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Storage for MemoryStorage {
    fn open(&self, path: &str) -> StorageResult<Arc<dyn ByteSource>> {
        let data = self
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        trace!("Opening in-memory object {} ({} bytes)", path, data.len());
        Ok(Arc::new(BufferSource::new(data)))
    }

    fn create(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        self.insert(path, Bytes::copy_from_slice(data));
        Ok(())
    }

    fn scan_buffer(&self) -> usize {
        self.scan_buffer
    }
}
