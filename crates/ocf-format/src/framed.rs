//! Length-framed byte strings
//!
//! A framed value is a long giving the byte count followed by that many raw
//! bytes. Metadata keys and values in the header use this framing.

use std::io::Read;

use crate::error::{OcfError, OcfResult};
use crate::varint::{read_long, write_long};

/// Read one framed byte string
///
/// The allocation grows with the bytes actually present, so a corrupt
/// length cannot reserve more memory than the source holds.
pub fn read_bytes<R: Read + ?Sized>(reader: &mut R) -> OcfResult<Vec<u8>> {
    let len = read_long(reader)?;
    if len < 0 {
        return Err(OcfError::NegativeLength(len));
    }
    let len = len as u64;

    let mut data = Vec::new();
    reader.take(len).read_to_end(&mut data)?;
    if (data.len() as u64) < len {
        return Err(OcfError::UnexpectedEndOfStream);
    }
    Ok(data)
}

/// Append one framed byte string to `out`
pub fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_long(out, data.len() as i64);
    out.extend_from_slice(data);
}
