//! Object container file format: decoding, encoding and chunk reconstruction
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_sign_loss)] // Lengths are checked before conversion
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::needless_pass_by_value)] // Configuration types
#![allow(clippy::missing_errors_doc)] // Error types are self-describing
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! This crate implements the self-describing binary container used to store
//! schema-tagged records: a header (magic, metadata map, sync token) followed
//! by data blocks, each terminated by the file's sync token.
//!
//! # Components
//!
//! - **Header**: metadata map and sync token, with the raw header bytes kept
//!   for chunk reconstruction
//! - **Blocks**: block framing and iteration with sync verification
//! - **Codecs**: `null`, `deflate` and `snappy` block compression
//! - **Partitioning**: splitting a file into byte windows
//! - **Chunks**: turning a located byte window into a standalone container
//! - **Records**: the [`RecordCodec`] seam and its Avro implementation
//! - **Writer**: producing complete containers
//!
//! # Example
//!
//! ```
//! use ocf_format::{AvroCodec, AvroSchema, ContainerWriter, RecordCodec, WriteOptions};
//!
//! let schema = AvroSchema::parse(r#""long""#)?;
//! let records = vec![apache_avro::types::Value::Long(7)];
//! let writer = ContainerWriter::new(WriteOptions::default())?;
//! let data = writer.to_vec(&AvroCodec, &schema, &records)?;
//! assert_eq!(AvroCodec.decode_records(&data)?, records);
//! # Ok::<(), ocf_format::OcfError>(())
//! ```

#![warn(missing_docs)]

pub mod block;
/// Chunk reconstruction for byte windows cut from a container
pub mod chunk;
pub mod codec;
pub mod error;
pub mod framed;
pub mod header;
pub mod partition;
pub mod record;
/// Zig-zag variable-length integer encoding
pub mod varint;
pub mod writer;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use block::{BlockIter, RawBlock, count_records};
pub use chunk::Chunk;
pub use codec::Codec;
pub use error::{OcfError, OcfResult};
pub use header::{Header, MAGIC, SYNC_SIZE, SyncToken};
pub use partition::{DEFAULT_PARTITION_SIZE, PartitionPlan, PartitionPlanner, Window};
pub use record::{AvroCodec, AvroSchema, RecordCodec, record_to_json};
pub use writer::{ContainerWriter, DEFAULT_SYNC_INTERVAL, WriteOptions};
