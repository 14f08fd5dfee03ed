//! Local filesystem storage with memory-mapped reads

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::MmapOptions;
use tracing::debug;

use super::Storage;
use crate::locator::DEFAULT_SCAN_BUFFER;
use crate::source::{BufferSource, ByteSource, MmapSource};
use crate::{StorageError, StorageResult};

/// Files on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: Option<PathBuf>,
    scan_buffer: usize,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorage {
    /// Storage resolving paths as given
    pub fn new() -> Self {
        Self {
            root: None,
            scan_buffer: DEFAULT_SCAN_BUFFER,
        }
    }

    /// Storage resolving relative paths against `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            ..Self::new()
        }
    }

    /// Set the size of each sync scanning read
    #[must_use]
    pub const fn with_scan_buffer(mut self, scan_buffer: usize) -> Self {
        self.scan_buffer = scan_buffer;
        self
    }

    /// Resolve a storage path to a filesystem path
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl Storage for LocalStorage {
    fn open(&self, path: &str) -> StorageResult<Arc<dyn ByteSource>> {
        let resolved = self.resolve(path);
        let file = File::open(&resolved).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(resolved.display().to_string()),
            _ => StorageError::io(&resolved, e),
        })?;
        let size = file
            .metadata()
            .map_err(|e| StorageError::io(&resolved, e))?
            .len();

        debug!("Opening {:?} (size: {} bytes)", resolved, size);

        // Zero-length files cannot be mapped on every platform
        if size == 0 {
            return Ok(Arc::new(BufferSource::default()));
        }

        #[allow(unsafe_code)]
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|e| StorageError::io(&resolved, e))?
        };
        Ok(Arc::new(MmapSource::new(mmap)))
    }

    fn create(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        fs::write(&resolved, data).map_err(|e| StorageError::io(&resolved, e))?;
        debug!("Wrote {:?} ({} bytes)", resolved, data.len());
        Ok(())
    }

    fn logical_size(&self, path: &str) -> StorageResult<u64> {
        let resolved = self.resolve(path);
        fs::metadata(&resolved)
            .map(|m| m.len())
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    StorageError::NotFound(resolved.display().to_string())
                }
                _ => StorageError::io(&resolved, e),
            })
    }

    fn scan_buffer(&self) -> usize {
        self.scan_buffer
    }
}
