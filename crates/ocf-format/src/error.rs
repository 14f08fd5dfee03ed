//! Container format error types

use thiserror::Error;

/// Error type for container decoding, encoding and chunk handling
#[derive(Debug, Error)]
pub enum OcfError {
    /// The stream does not start with the container magic
    #[error("invalid container magic: expected [4F 62 6A 01], got {0:02X?}")]
    BadMagic([u8; 4]),

    /// A variable-length integer ran past the maximum encoded length
    #[error("malformed varint: more than {max_bytes} bytes or value overflows 64 bits")]
    MalformedVarint {
        /// Maximum number of bytes a long may occupy
        max_bytes: usize,
    },

    /// A length prefix decoded to a negative value
    #[error("negative length: {0}")]
    NegativeLength(i64),

    /// The source ended before a complete value could be read
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Codec name is not one of the supported codecs
    #[error("unsupported codec: {0:?} (expected one of null, deflate, snappy)")]
    UnsupportedCodec(String),

    /// Sync interval must be at least one record per block
    #[error("invalid sync interval: {0} (must be positive)")]
    InvalidSyncInterval(usize),

    /// Partition size must be positive when byte-range partitioning is used
    #[error("invalid partition size: {0} (must be positive)")]
    InvalidPartitionSize(u64),

    /// Metadata key is not valid UTF-8
    #[error("metadata key is not valid UTF-8: {0:02X?}")]
    InvalidMetadataKey(Vec<u8>),

    /// Caller metadata tried to set a key owned by the writer
    #[error("metadata key {0:?} is reserved")]
    ReservedMetadataKey(String),

    /// A block was not terminated by the file's sync token
    #[error("sync token mismatch after block {block}: expected {expected}, got {actual}")]
    SyncMismatch {
        /// Index of the block within the stream
        block: usize,
        /// Sync token from the header (hex)
        expected: String,
        /// Bytes found after the block (hex)
        actual: String,
    },

    /// Compression or decompression failed
    #[error("compression error: {0}")]
    Compression(String),

    /// Error reported by the record codec
    #[error("record codec error: {0}")]
    Record(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for OcfError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEndOfStream
        } else {
            Self::Io(err)
        }
    }
}

/// Result type for container operations
pub type OcfResult<T> = Result<T, OcfError>;
