//! Sync boundary location for byte windows
//!
//! A window `(offset, length)` is widened or narrowed to whole blocks:
//!
//! - the start moves to just after the first sync token beginning at or
//!   after `offset` (offset 0 stays at 0, where the header begins)
//! - the end moves to just after the first sync token beginning at or after
//!   `offset + length`
//! - a search that finds no token stops at the end of the source
//!
//! Adjacent windows search from their shared boundary, so both agree on the
//! token that splits them and no block is read twice or skipped. A window
//! lying inside one block yields an empty buffer.
//!
//! The source is scanned in `scan_buffer`-sized reads that overlap by
//! `SYNC_SIZE - 1` bytes, so a token straddling two reads is still found.
//! A search is at worst one linear pass over the rest of the source.

use ocf_format::{SYNC_SIZE, SyncToken};
use tracing::trace;

use crate::StorageResult;
use crate::source::ByteSource;

/// Default size of each scanning read (64 KiB)
pub const DEFAULT_SCAN_BUFFER: usize = 64 * 1024;

/// Smallest usable scan buffer
pub const MIN_SCAN_BUFFER: usize = 2 * SYNC_SIZE;

/// Find the position just after the first `sync` token starting at or after `from`
///
/// Returns the source length when no such token exists.
pub fn find_sync_end(
    source: &dyn ByteSource,
    from: u64,
    sync: &SyncToken,
    scan_buffer: usize,
) -> u64 {
    let size = source.len();
    let mut buf = vec![0u8; scan_buffer.max(MIN_SCAN_BUFFER)];
    let mut position = from;

    while position < size {
        let n = source.read_at(position, &mut buf);
        if n == 0 {
            break;
        }
        if let Some(index) = buf[..n].windows(SYNC_SIZE).position(|w| w == sync) {
            let end = position + (index + SYNC_SIZE) as u64;
            trace!("Found sync token at {} (search from {})", end - SYNC_SIZE as u64, from);
            return end;
        }
        if position + n as u64 >= size {
            break;
        }
        // Keep the tail so a token split across reads is still matched
        position += (n - (SYNC_SIZE - 1)) as u64;
    }

    trace!("No sync token after {}, using end of source {}", from, size);
    size
}

/// Locate the whole blocks covering a window
///
/// Returns the `(start, end)` byte range, which may be empty.
pub fn locate(
    source: &dyn ByteSource,
    offset: u64,
    length: u64,
    sync: &SyncToken,
    scan_buffer: usize,
) -> (u64, u64) {
    let start = if offset == 0 {
        0
    } else {
        find_sync_end(source, offset, sync, scan_buffer)
    };
    let end = find_sync_end(source, offset.saturating_add(length), sync, scan_buffer);
    (start, end.max(start))
}

/// Read the whole blocks covering a window
pub fn read_block(
    source: &dyn ByteSource,
    offset: u64,
    length: u64,
    sync: &SyncToken,
    scan_buffer: usize,
) -> StorageResult<Vec<u8>> {
    let (start, end) = locate(source, offset, length, sync, scan_buffer);
    trace!(
        "Window ({}, {}) located at [{}, {})",
        offset, length, start, end
    );
    source.read_range(start, end - start)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::BufferSource;
    use pretty_assertions::assert_eq;

    const SYNC: SyncToken = *b"SYNCSYNCSYNCSYNC";

    /// `hdr` + token, then three blocks each followed by the token
    fn layout() -> Vec<u8> {
        let mut data = b"hdr".to_vec();
        data.extend_from_slice(&SYNC);
        for block in [&b"block-one"[..], b"block-two!", b"b3"] {
            data.extend_from_slice(block);
            data.extend_from_slice(&SYNC);
        }
        data
    }

    #[test]
    fn test_find_sync_end() {
        let data = layout();
        let source = BufferSource::new(data.clone());

        assert_eq!(find_sync_end(&source, 0, &SYNC, 64), 19);
        assert_eq!(find_sync_end(&source, 3, &SYNC, 64), 19);
        // A token beginning before the search start is not matched
        assert_eq!(find_sync_end(&source, 4, &SYNC, 64), 44);
        assert_eq!(find_sync_end(&source, data.len() as u64, &SYNC, 64), data.len() as u64);
    }

    #[test]
    fn test_token_straddling_reads() {
        let data = layout();
        let source = BufferSource::new(data.clone());
        for scan_buffer in [MIN_SCAN_BUFFER, 33, 40, 1024] {
            assert_eq!(find_sync_end(&source, 20, &SYNC, scan_buffer), 44);
            assert_eq!(find_sync_end(&source, 45, &SYNC, scan_buffer), 70);
        }
        // Undersized buffers are raised to the minimum
        assert_eq!(find_sync_end(&source, 20, &SYNC, 1), 44);
    }

    #[test]
    fn test_adjacent_windows_agree() {
        let data = layout();
        let source = BufferSource::new(data.clone());
        let size = data.len() as u64;

        for split in 1..size {
            let first = read_block(&source, 0, split, &SYNC, 32).unwrap();
            let second = read_block(&source, split, size - split, &SYNC, 32).unwrap();
            let mut joined = first;
            joined.extend(second);
            assert_eq!(joined, data, "split at {split}");
        }
    }

    #[test]
    fn test_window_inside_block_is_empty() {
        let source = BufferSource::new(layout());
        // Bytes 20..24 are inside "block-one"
        assert_eq!(read_block(&source, 20, 4, &SYNC, 64).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_first_window_includes_header() {
        let source = BufferSource::new(layout());
        let located = read_block(&source, 0, 3, &SYNC, 64).unwrap();
        assert!(located.starts_with(b"hdr"));
        assert_eq!(located.len(), 19);

        // Past the header token the window extends through the first block
        assert_eq!(read_block(&source, 0, 5, &SYNC, 64).unwrap().len(), 44);
    }

    #[test]
    fn test_missing_token_runs_to_end() {
        let source = BufferSource::new(b"no tokens anywhere in this data".to_vec());
        assert_eq!(locate(&source, 3, 4, &SYNC, 64), (31, 31));
        assert_eq!(locate(&source, 0, 4, &SYNC, 64), (0, 31));
    }
}
