//! Data block framing and iteration
//!
//! Each block after the header is an object count, a payload byte size, the
//! (possibly compressed) payload and the file's sync token. Record bytes
//! inside the payload are opaque at this layer.

use std::io::{Cursor, Read};

use crate::codec::Codec;
use crate::error::{OcfError, OcfResult};
use crate::header::{Header, SYNC_SIZE};
use crate::varint::{read_long, write_long};

/// One decoded block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Number of records in the block
    pub object_count: u64,
    /// Decompressed payload holding the encoded records back to back
    pub payload: Vec<u8>,
}

/// Frame an already compressed payload as a block body
///
/// The result excludes the trailing sync token, which the writer appends.
pub fn frame_block(object_count: usize, compressed_payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(compressed_payload.len() + 20);
    write_long(&mut out, object_count as i64);
    write_long(&mut out, compressed_payload.len() as i64);
    out.extend_from_slice(compressed_payload);
    out
}

/// Iterator over the blocks of a complete container held in memory
///
/// Works equally on whole files and on reconstructed chunks. Iteration stops
/// cleanly when the data ends exactly on a block boundary; any other
/// truncation is reported as an error, after which the iterator is fused.
pub struct BlockIter<'a> {
    header: Header,
    codec: Codec,
    cursor: Cursor<&'a [u8]>,
    index: usize,
    failed: bool,
}

impl<'a> BlockIter<'a> {
    /// Decode the header at the start of `data` and prepare to walk its blocks
    pub fn new(data: &'a [u8]) -> OcfResult<Self> {
        let mut cursor = Cursor::new(data);
        let header = Header::read(&mut cursor)?;
        let codec = header.codec()?;
        Ok(Self {
            header,
            codec,
            cursor,
            index: 0,
            failed: false,
        })
    }

    /// Header of the container being iterated
    pub fn header(&self) -> &Header {
        &self.header
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn read_block(&mut self) -> OcfResult<RawBlock> {
        let count = read_long(&mut self.cursor)?;
        if count < 0 {
            return Err(OcfError::NegativeLength(count));
        }
        let size = read_long(&mut self.cursor)?;
        if size < 0 {
            return Err(OcfError::NegativeLength(size));
        }
        let size = size as u64;
        if size > self.remaining() as u64 {
            return Err(OcfError::UnexpectedEndOfStream);
        }

        let mut compressed = vec![0u8; size as usize];
        self.cursor.read_exact(&mut compressed)?;

        let mut sync = [0u8; SYNC_SIZE];
        self.cursor.read_exact(&mut sync)?;
        if sync != self.header.sync {
            return Err(OcfError::SyncMismatch {
                block: self.index,
                expected: hex::encode(self.header.sync),
                actual: hex::encode(sync),
            });
        }

        let payload = self.codec.decompress(&compressed)?;
        Ok(RawBlock {
            object_count: count as u64,
            payload,
        })
    }
}

impl Iterator for BlockIter<'_> {
    type Item = OcfResult<RawBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining() == 0 {
            return None;
        }
        let result = self.read_block();
        match result {
            Ok(_) => self.index += 1,
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

/// Count the records in a complete container without decoding them
pub fn count_records(data: &[u8]) -> OcfResult<u64> {
    BlockIter::new(data)?.try_fold(0u64, |total, block| Ok(total + block?.object_count))
}
