//! Whole-file compression wrappers
//!
//! A wrapped file is decompressed completely before the container is read.
//! Byte offsets are only meaningful against the physical file, so wrapped
//! input is always read as whole files.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{StorageError, StorageResult};

/// Compression applied to an entire file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCompression {
    /// gzip (RFC 1952)
    Gzip,
    /// zlib (RFC 1950)
    Zlib,
}

impl FileCompression {
    /// Resolve a wrapper by name
    pub fn from_name(name: &str) -> StorageResult<Self> {
        match name {
            "gzip" | "gz" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            other => Err(StorageError::UnsupportedCompression(other.to_string())),
        }
    }

    /// Canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
        }
    }

    /// Guess the wrapper from a path's extension
    pub fn infer(path: &str) -> Option<Self> {
        let extension = path.rsplit_once('.')?.1;
        match extension {
            "gz" => Some(Self::Gzip),
            "zz" | "zlib" => Some(Self::Zlib),
            _ => None,
        }
    }

    /// Decompress a complete file
    pub fn decompress(self, data: &[u8]) -> StorageResult<Vec<u8>> {
        let mut out = Vec::new();
        let result = match self {
            Self::Gzip => GzDecoder::new(data).read_to_end(&mut out),
            Self::Zlib => ZlibDecoder::new(data).read_to_end(&mut out),
        };
        result.map_err(|e| StorageError::io(format!("<{} stream>", self.name()), e))?;
        debug!(
            "Decompressed {} file: {} -> {} bytes",
            self,
            data.len(),
            out.len()
        );
        Ok(out)
    }

    /// Compress a complete file
    pub fn compress(self, data: &[u8]) -> StorageResult<Vec<u8>> {
        let wrap = |e: std::io::Error| StorageError::io(format!("<{} stream>", self.name()), e);
        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).map_err(wrap)?;
                encoder.finish().map_err(wrap)
            }
            Self::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).map_err(wrap)?;
                encoder.finish().map_err(wrap)
            }
        }
    }
}

impl fmt::Display for FileCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileCompression {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
