//! Container header decoding and encoding
//!
//! The header is the magic marker, a metadata map written as a chain of
//! count-prefixed blocks ended by a zero count, and the 16-byte sync token.
//! Besides the decoded fields, [`Header`] keeps the raw header bytes so they
//! can be prepended to chunks cut from the middle of the file.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::codec::Codec;
use crate::error::{OcfError, OcfResult};
use crate::framed::{read_bytes, write_bytes};
use crate::varint::{read_long, write_long};

/// Container magic: `Obj` followed by format version 1
pub const MAGIC: [u8; 4] = *b"Obj\x01";

/// Size of the sync token in bytes
pub const SYNC_SIZE: usize = 16;

/// Sync token delimiting blocks within one file
pub type SyncToken = [u8; SYNC_SIZE];

/// Metadata key holding the writer schema
pub const SCHEMA_KEY: &str = "avro.schema";

/// Metadata key holding the block codec name
pub const CODEC_KEY: &str = "avro.codec";

/// Decoded container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Metadata map; later duplicates overwrite earlier entries
    pub metadata: BTreeMap<String, Vec<u8>>,
    /// File-wide sync token
    pub sync: SyncToken,
    /// Raw bytes of the file from offset 0 to the end of the sync token
    pub header_bytes: Vec<u8>,
}

impl Header {
    /// Read a header from a seekable source
    ///
    /// The source is rewound to offset 0 first. After the fields are decoded,
    /// the header region is re-read from offset 0 into `header_bytes` and the
    /// stream is left positioned at the end of the header.
    pub fn read<R: Read + Seek>(reader: &mut R) -> OcfResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let (metadata, sync) = read_fields(reader)?;
        let header_len = reader.stream_position()?;

        reader.seek(SeekFrom::Start(0))?;
        let mut header_bytes = Vec::new();
        reader.take(header_len).read_to_end(&mut header_bytes)?;
        if (header_bytes.len() as u64) < header_len {
            return Err(OcfError::UnexpectedEndOfStream);
        }

        debug!(
            "Decoded header: {} metadata entries, {} bytes",
            metadata.len(),
            header_len
        );

        Ok(Self {
            metadata,
            sync,
            header_bytes,
        })
    }

    /// Read a header from a forward-only source
    ///
    /// Bytes are recorded as they are consumed, so no second pass is needed.
    /// The reader is left positioned at the end of the header.
    pub fn read_buffered<R: Read>(reader: &mut R) -> OcfResult<Self> {
        let mut recorder = Recorder {
            inner: reader,
            recorded: Vec::new(),
        };
        let (metadata, sync) = read_fields(&mut recorder)?;

        debug!(
            "Decoded header (buffered): {} metadata entries, {} bytes",
            metadata.len(),
            recorder.recorded.len()
        );

        Ok(Self {
            metadata,
            sync,
            header_bytes: recorder.recorded,
        })
    }

    /// Decode a header from the start of an in-memory buffer
    pub fn parse(data: &[u8]) -> OcfResult<Self> {
        Self::read_buffered(&mut &data[..])
    }

    /// Encode a header with a single metadata block
    pub fn build(metadata: BTreeMap<String, Vec<u8>>, sync: SyncToken) -> Self {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&MAGIC);
        if !metadata.is_empty() {
            write_long(&mut out, metadata.len() as i64);
            for (key, value) in &metadata {
                write_bytes(&mut out, key.as_bytes());
                write_bytes(&mut out, value);
            }
        }
        write_long(&mut out, 0);
        out.extend_from_slice(&sync);

        Self {
            metadata,
            sync,
            header_bytes: out,
        }
    }

    /// Length of the header in bytes; blocks start at this offset
    pub fn header_len(&self) -> u64 {
        self.header_bytes.len() as u64
    }

    /// Look up a metadata value
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.metadata.get(key).map(Vec::as_slice)
    }

    /// Look up a metadata value as UTF-8 text
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Writer schema JSON, if present
    pub fn schema_json(&self) -> Option<&str> {
        self.get_str(SCHEMA_KEY)
    }

    /// Codec used for block payloads (`null` when absent)
    pub fn codec(&self) -> OcfResult<Codec> {
        match self.get(CODEC_KEY) {
            None => Ok(Codec::Null),
            Some(name) => Codec::from_name(&String::from_utf8_lossy(name)),
        }
    }

    /// Sync token as lowercase hex
    pub fn sync_hex(&self) -> String {
        hex::encode(self.sync)
    }
}

/// Decode magic, metadata blocks and sync token
fn read_fields<R: Read + ?Sized>(
    reader: &mut R,
) -> OcfResult<(BTreeMap<String, Vec<u8>>, SyncToken)> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(OcfError::BadMagic(magic));
    }

    let mut metadata = BTreeMap::new();
    loop {
        let mut count = read_long(reader)?;
        if count == 0 {
            break;
        }
        if count < 0 {
            // Negative counts carry the block's byte size, which is not needed here.
            let byte_size = read_long(reader)?;
            trace!("Metadata block with byte size {}", byte_size);
            count = count.checked_neg().ok_or(OcfError::NegativeLength(count))?;
        }

        for _ in 0..count {
            let key = read_bytes(reader)?;
            let key = String::from_utf8(key).map_err(|e| OcfError::InvalidMetadataKey(e.into_bytes()))?;
            let value = read_bytes(reader)?;
            metadata.insert(key, value);
        }
    }

    let mut sync = [0u8; SYNC_SIZE];
    reader.read_exact(&mut sync)?;
    Ok((metadata, sync))
}

/// Reader adapter that keeps a copy of every byte it hands out
struct Recorder<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    recorded: Vec<u8>,
}

impl<R: Read + ?Sized> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.recorded.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
