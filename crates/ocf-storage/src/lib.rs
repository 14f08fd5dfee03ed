//! Storage and parallel read layer for object container files.
//!
//! This crate supplies everything around the container format that touches
//! bytes on storage:
//!
//! - **Storage backends**: [`LocalStorage`] (memory-mapped files) and
//!   [`MemoryStorage`] (named in-memory objects), both behind the [`Storage`]
//!   trait, with optional whole-file gzip/zlib wrappers
//! - **Boundary location**: scanning a byte window for the file's sync token
//!   so that it is cut on block boundaries
//! - **Read planning**: a per-file task map keyed by deterministic task keys
//! - **Parallel reads**: [`DatasetReader`] runs every window as an
//!   independent unit of work on a `rayon` pool
//! - **Dataset writes**: one container per partition with a naming scheme
//!
//! # Example
//!
//! ```rust,ignore
//! use ocf_format::AvroCodec;
//! use ocf_storage::{DatasetReader, LocalStorage, ReadOptions};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(LocalStorage::new());
//! let reader = DatasetReader::new(storage, ReadOptions::default())?;
//! let output = reader.read_records(&["events-0.avro", "events-1.avro"], &AvroCodec)?;
//! for failure in output.failures() {
//!     eprintln!("{} failed: {:?}", failure.key, failure.result.as_ref().err());
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;

use ocf_format::OcfError;
use thiserror::Error;

pub mod compression;
pub mod locator;
pub mod options;
pub mod plan;
pub mod reader;
pub mod source;
pub mod storage;
pub mod writer;

pub use compression::FileCompression;
pub use options::ReadOptions;
pub use plan::{ChunkTask, FilePlan, ReadPlan, TaskKey, TaskKind};
pub use reader::{DatasetOutput, DatasetReader, WindowOutput};
pub use source::{BufferSource, ByteSource, MmapSource, SourceReader};
pub use storage::{LocalStorage, MemoryStorage, Storage};
pub use writer::{OutputNames, default_name_function, write_dataset};

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Container format error.
    #[error("Format error: {0}")]
    Format(#[from] OcfError),

    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was performed on
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Object not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Read outside the bounds of a byte source.
    #[error("Read beyond bounds: offset={offset}, length={length}, size={size}")]
    OutOfBounds {
        /// Requested offset
        offset: u64,
        /// Requested length
        length: u64,
        /// Size of the source
        size: u64,
    },

    /// Compression wrapper name is not known.
    #[error("Unsupported compression: {0:?} (expected gzip or zlib)")]
    UnsupportedCompression(String),

    /// Whole-file compression cannot be combined with byte-range partitioning.
    #[error(
        "Compressed input ({0}) must be read as whole files; set partition_size to None"
    )]
    ChunkedCompressedInput(FileCompression),

    /// Output naming produced the wrong number of paths.
    #[error("Expected {expected} output paths, got {actual}")]
    NameCount {
        /// Number of partitions to write
        expected: usize,
        /// Number of names supplied
        actual: usize,
    },

    /// Output pattern has more than one `*` placeholder.
    #[error("Output pattern {0:?} must contain at most one '*'")]
    InvalidPattern(String),

    /// Worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl StorageError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Version information for the storage layer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
