//! Chunk reconstruction
//!
//! A byte window cut from the middle of a container holds only whole blocks.
//! Prepending the file's header bytes turns it back into a standalone
//! container that any reader for the format accepts. The first window of a
//! file already starts with the header and is passed through unchanged.

use tracing::trace;

use crate::block::BlockIter;
use crate::error::OcfResult;
use crate::header::{Header, MAGIC};

/// A self-contained container built from one located byte window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    bytes: Vec<u8>,
    header_prepended: bool,
}

impl Chunk {
    /// Combine a header with the blocks located for one window
    pub fn reconstruct(header: &Header, located: Vec<u8>) -> Self {
        if located.starts_with(&MAGIC) {
            trace!("Chunk of {} bytes already carries the header", located.len());
            return Self {
                bytes: located,
                header_prepended: false,
            };
        }

        let mut bytes = Vec::with_capacity(header.header_bytes.len() + located.len());
        bytes.extend_from_slice(&header.header_bytes);
        bytes.extend_from_slice(&located);
        trace!(
            "Prepended {} header bytes to {} block bytes",
            header.header_bytes.len(),
            located.len()
        );
        Self {
            bytes,
            header_prepended: true,
        }
    }

    /// Whether the header had to be copied in front of the blocks
    pub fn header_prepended(&self) -> bool {
        self.header_prepended
    }

    /// The complete container bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the chunk, returning the container bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Iterate the blocks of this chunk
    pub fn blocks(&self) -> OcfResult<BlockIter<'_>> {
        BlockIter::new(&self.bytes)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block::count_records;
    use crate::codec::Codec;
    use crate::test_utils::write_longs;

    #[test]
    fn test_first_window_passes_through() {
        let data = write_longs(&[1, 2, 3], Codec::Null, 2);
        let header = Header::parse(&data).unwrap();

        let chunk = Chunk::reconstruct(&header, data.clone());
        assert!(!chunk.header_prepended());
        assert_eq!(chunk.as_bytes(), data.as_slice());
    }

    #[test]
    fn test_middle_window_gets_header() {
        let data = write_longs(&(0..9).collect::<Vec<_>>(), Codec::Null, 3);
        let header = Header::parse(&data).unwrap();
        let blocks = data[header.header_bytes.len()..].to_vec();

        let chunk = Chunk::reconstruct(&header, blocks);
        assert!(chunk.header_prepended());
        assert_eq!(chunk.as_bytes(), data.as_slice());
        assert_eq!(count_records(chunk.as_bytes()).unwrap(), 9);
    }

    #[test]
    fn test_empty_window_is_header_only() {
        let data = write_longs(&[10, 20], Codec::Snappy, 1);
        let header = Header::parse(&data).unwrap();

        let chunk = Chunk::reconstruct(&header, Vec::new());
        assert_eq!(chunk.as_bytes(), header.header_bytes.as_slice());
        assert_eq!(chunk.blocks().unwrap().count(), 0);
    }

    #[test]
    fn test_short_window_is_not_mistaken_for_magic() {
        let data = write_longs(&[], Codec::Null, 1);
        let header = Header::parse(&data).unwrap();

        let chunk = Chunk::reconstruct(&header, b"Ob".to_vec());
        assert!(chunk.header_prepended());
        assert_eq!(chunk.into_bytes().len(), header.header_bytes.len() + 2);
    }
}
