//! Test utilities shared by the format test modules
//!
//! [`LongCodec`] is a minimal record codec storing plain zig-zag longs, so
//! container mechanics can be tested without a schema library.

use std::io::Cursor;

use crate::block::{BlockIter, frame_block};
use crate::codec::Codec;
use crate::error::OcfResult;
use crate::header::SyncToken;
use crate::record::RecordCodec;
use crate::varint::{read_long, write_long};
use crate::writer::{ContainerWriter, WriteOptions};

/// Fixed sync token for deterministic test files
pub const TEST_SYNC: SyncToken = *b"0123456789abcdef";

/// Record codec whose records are bare longs
#[derive(Debug, Clone, Copy, Default)]
pub struct LongCodec;

impl RecordCodec for LongCodec {
    type Record = i64;
    type Schema = ();

    fn schema_json(&self, _schema: &()) -> String {
        "\"long\"".to_string()
    }

    fn encode_block(&self, records: &[i64], _schema: &(), codec: Codec) -> OcfResult<Vec<u8>> {
        let mut payload = Vec::with_capacity(records.len() * 2);
        for value in records {
            write_long(&mut payload, *value);
        }
        let compressed = codec.compress(&payload)?;
        Ok(frame_block(records.len(), &compressed))
    }

    fn decode_records(&self, container: &[u8]) -> OcfResult<Vec<i64>> {
        let mut values = Vec::new();
        for block in BlockIter::new(container)? {
            let block = block?;
            let mut payload = Cursor::new(block.payload.as_slice());
            for _ in 0..block.object_count {
                values.push(read_long(&mut payload)?);
            }
        }
        Ok(values)
    }
}

/// Write `values` as a container with the fixed test sync token
pub fn write_longs(values: &[i64], codec: Codec, sync_interval: usize) -> Vec<u8> {
    let options = WriteOptions::default()
        .with_codec(codec)
        .with_sync_interval(sync_interval);
    ContainerWriter::with_sync(options, TEST_SYNC)
        .expect("test options should be valid")
        .to_vec(&LongCodec, &(), values)
        .expect("test container should encode")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::Header;

    #[test]
    fn test_long_codec_round_trip() {
        let values = vec![0, -1, 1, i64::MIN, i64::MAX, 300];
        let data = write_longs(&values, Codec::Deflate, 4);
        assert_eq!(LongCodec.decode_records(&data).unwrap(), values);
    }

    #[test]
    fn test_written_header_parses_back() {
        let data = write_longs(&[1, 2], Codec::Null, 1);
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.sync, TEST_SYNC);
        assert_eq!(Header::parse(&header.header_bytes).unwrap(), header);
        assert!(Header::parse(b"Obj").is_err());
    }
}
