//! Block payload codecs
//!
//! The codec is chosen by name when writing and recorded in the header
//! under `avro.codec`. Payloads are compressed per block; the block framing
//! itself (object count, payload size, sync token) is never compressed.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use serde::{Deserialize, Serialize};

use crate::error::{OcfError, OcfResult};

/// Maximum allowed decompressed block size (1 GB)
///
/// Guards against compression bombs in untrusted files.
pub const MAX_DECOMPRESSION_SIZE: usize = 1024 * 1024 * 1024;

/// Supported block codecs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Payload stored as-is
    #[default]
    #[serde(alias = "none")]
    Null,
    /// Raw DEFLATE (RFC 1951, no zlib wrapper)
    Deflate,
    /// Raw snappy followed by the big-endian CRC-32 of the uncompressed payload
    Snappy,
}

impl Codec {
    /// Every supported codec
    pub const ALL: [Self; 3] = [Self::Null, Self::Deflate, Self::Snappy];

    /// Resolve a codec by its header name
    pub fn from_name(name: &str) -> OcfResult<Self> {
        match name {
            "null" | "none" => Ok(Self::Null),
            "deflate" => Ok(Self::Deflate),
            "snappy" => Ok(Self::Snappy),
            other => Err(OcfError::UnsupportedCodec(other.to_string())),
        }
    }

    /// Canonical name written to the header
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Deflate => "deflate",
            Self::Snappy => "snappy",
        }
    }

    /// Compress one block payload
    pub fn compress(self, data: &[u8]) -> OcfResult<Vec<u8>> {
        match self {
            Self::Null => Ok(data.to_vec()),
            Self::Deflate => {
                let mut encoder = DeflateEncoder::new(data, Compression::default());
                let mut compressed = Vec::new();
                encoder.read_to_end(&mut compressed).map_err(|e| {
                    OcfError::Compression(format!("deflate compression failed: {e}"))
                })?;
                Ok(compressed)
            }
            Self::Snappy => {
                let mut compressed = snap::raw::Encoder::new()
                    .compress_vec(data)
                    .map_err(|e| OcfError::Compression(format!("snappy compression failed: {e}")))?;
                compressed.extend_from_slice(&crc32fast::hash(data).to_be_bytes());
                Ok(compressed)
            }
        }
    }

    /// Decompress one block payload
    pub fn decompress(self, data: &[u8]) -> OcfResult<Vec<u8>> {
        match self {
            Self::Null => Ok(data.to_vec()),
            Self::Deflate => {
                let mut decoder = DeflateDecoder::new(data);
                let mut decompressed = Vec::new();

                // Read in pieces to enforce the size limit
                let mut buffer = [0u8; 8192];
                loop {
                    let bytes_read = decoder.read(&mut buffer).map_err(|e| {
                        OcfError::Compression(format!("deflate decompression failed: {e}"))
                    })?;
                    if bytes_read == 0 {
                        break;
                    }
                    if decompressed.len() + bytes_read > MAX_DECOMPRESSION_SIZE {
                        return Err(OcfError::Compression(format!(
                            "decompressed size exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
                        )));
                    }
                    decompressed.extend_from_slice(&buffer[..bytes_read]);
                }

                Ok(decompressed)
            }
            Self::Snappy => {
                if data.len() < 4 {
                    return Err(OcfError::Compression(
                        "snappy payload too short - missing checksum".to_string(),
                    ));
                }
                let (body, checksum) = data.split_at(data.len() - 4);

                let expected_len = snap::raw::decompress_len(body)
                    .map_err(|e| OcfError::Compression(format!("snappy header invalid: {e}")))?;
                if expected_len > MAX_DECOMPRESSION_SIZE {
                    return Err(OcfError::Compression(format!(
                        "snappy decompressed size {expected_len} exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
                    )));
                }

                let decompressed = snap::raw::Decoder::new()
                    .decompress_vec(body)
                    .map_err(|e| OcfError::Compression(format!("snappy decompression failed: {e}")))?;

                let expected = u32::from_be_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);
                let actual = crc32fast::hash(&decompressed);
                if expected != actual {
                    return Err(OcfError::Compression(format!(
                        "snappy checksum mismatch: expected {expected:08X}, got {actual:08X}"
                    )));
                }

                Ok(decompressed)
            }
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = OcfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
