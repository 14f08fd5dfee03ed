//! Container writer
//!
//! Writes one complete container: header with the caller's metadata plus
//! schema and codec entries, a fresh random sync token, then blocks of at
//! most `sync_interval` records, each followed by the token.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Codec;
use crate::error::{OcfError, OcfResult};
use crate::header::{CODEC_KEY, Header, SCHEMA_KEY, SYNC_SIZE, SyncToken};
use crate::record::RecordCodec;

/// Default number of records per block
pub const DEFAULT_SYNC_INTERVAL: usize = 16_000;

/// Metadata key prefix reserved for the writer
const RESERVED_PREFIX: &str = "avro.";

/// Options controlling how a container is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Block payload codec
    pub codec: Codec,
    /// Maximum number of records per block
    pub sync_interval: usize,
    /// Extra header metadata
    pub metadata: BTreeMap<String, Vec<u8>>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            codec: Codec::Null,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            metadata: BTreeMap::new(),
        }
    }
}

impl WriteOptions {
    /// Set the block codec
    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the block codec by name
    pub fn with_codec_name(self, name: &str) -> OcfResult<Self> {
        Ok(self.with_codec(Codec::from_name(name)?))
    }

    /// Set the number of records per block
    #[must_use]
    pub fn with_sync_interval(mut self, sync_interval: usize) -> Self {
        self.sync_interval = sync_interval;
        self
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check the options before any output is produced
    pub fn validate(&self) -> OcfResult<()> {
        if self.sync_interval == 0 {
            return Err(OcfError::InvalidSyncInterval(self.sync_interval));
        }
        if let Some(key) = self
            .metadata
            .keys()
            .find(|key| key.starts_with(RESERVED_PREFIX))
        {
            return Err(OcfError::ReservedMetadataKey(key.clone()));
        }
        Ok(())
    }
}

/// Generate a random sync token
pub fn random_sync() -> SyncToken {
    rand::random()
}

/// Writer for a single container file
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    options: WriteOptions,
    sync: SyncToken,
}

impl ContainerWriter {
    /// Create a writer with a freshly generated sync token
    pub fn new(options: WriteOptions) -> OcfResult<Self> {
        Self::with_sync(options, random_sync())
    }

    /// Create a writer with a caller-chosen sync token
    pub fn with_sync(options: WriteOptions, sync: SyncToken) -> OcfResult<Self> {
        options.validate()?;
        Ok(Self { options, sync })
    }

    /// Sync token written after the header and every block
    pub fn sync(&self) -> &SyncToken {
        &self.sync
    }

    /// Options this writer was created with
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Build the header for records encoded by `codec` against `schema`
    pub fn header<C: RecordCodec>(&self, codec: &C, schema: &C::Schema) -> Header {
        let mut metadata = self.options.metadata.clone();
        metadata.insert(SCHEMA_KEY.to_string(), codec.schema_json(schema).into_bytes());
        metadata.insert(
            CODEC_KEY.to_string(),
            self.options.codec.name().as_bytes().to_vec(),
        );
        Header::build(metadata, self.sync)
    }

    /// Write a complete container to `out`, returning the bytes written
    pub fn write<W: Write, C: RecordCodec>(
        &self,
        out: &mut W,
        codec: &C,
        schema: &C::Schema,
        records: &[C::Record],
    ) -> OcfResult<u64> {
        let header = self.header(codec, schema);
        out.write_all(&header.header_bytes)?;
        let mut written = header.header_len();

        let mut blocks = 0usize;
        for batch in records.chunks(self.options.sync_interval) {
            let block = codec.encode_block(batch, schema, self.options.codec)?;
            out.write_all(&block)?;
            out.write_all(&self.sync)?;
            written += (block.len() + SYNC_SIZE) as u64;
            blocks += 1;
        }

        debug!(
            "Wrote container: {} records in {} blocks, {} bytes, codec {}",
            records.len(),
            blocks,
            written,
            self.options.codec
        );
        Ok(written)
    }

    /// Write a complete container into memory
    pub fn to_vec<C: RecordCodec>(
        &self,
        codec: &C,
        schema: &C::Schema,
        records: &[C::Record],
    ) -> OcfResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, codec, schema, records)?;
        Ok(out)
    }
}
