//! Read configuration

use ocf_format::{DEFAULT_PARTITION_SIZE, OcfError, PartitionPlanner};
use serde::{Deserialize, Serialize};

use crate::compression::FileCompression;
use crate::{StorageError, StorageResult};

/// Options controlling how a dataset is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Target window size in bytes; `None` reads every file whole
    pub partition_size: Option<u64>,
    /// Compression wrapping each input file
    pub compression: Option<FileCompression>,
    /// Worker threads for the read pool; `None` uses the global pool
    pub parallelism: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            partition_size: Some(DEFAULT_PARTITION_SIZE),
            compression: None,
            parallelism: None,
        }
    }
}

impl ReadOptions {
    /// Set the target window size
    #[must_use]
    pub const fn with_partition_size(mut self, partition_size: Option<u64>) -> Self {
        self.partition_size = partition_size;
        self
    }

    /// Read every file as a single partition
    #[must_use]
    pub const fn whole_file(self) -> Self {
        self.with_partition_size(None)
    }

    /// Set the input compression wrapper
    #[must_use]
    pub const fn with_compression(mut self, compression: Option<FileCompression>) -> Self {
        self.compression = compression;
        self
    }

    /// Set the number of worker threads
    #[must_use]
    pub const fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Check the options before any I/O is attempted
    pub fn validate(&self) -> StorageResult<()> {
        if self.partition_size == Some(0) {
            return Err(OcfError::InvalidPartitionSize(0).into());
        }
        if let (Some(compression), Some(_)) = (self.compression, self.partition_size) {
            return Err(StorageError::ChunkedCompressedInput(compression));
        }
        Ok(())
    }

    /// Planner for these options
    pub fn planner(&self) -> StorageResult<PartitionPlanner> {
        Ok(PartitionPlanner::new(self.partition_size)?)
    }
}
