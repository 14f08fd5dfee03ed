//! Zig-zag variable-length longs
//!
//! Every integer in the container header and block framing is a signed
//! 64-bit value, zig-zag mapped to an unsigned magnitude and written in
//! 7-bit groups, low group first. The high bit of each byte marks that
//! another byte follows.

use std::io::Read;

use crate::error::{OcfError, OcfResult};

/// Longest valid encoding of a 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Read a single byte, mapping exhaustion to `UnexpectedEndOfStream`
pub(crate) fn read_byte<R: Read + ?Sized>(reader: &mut R) -> OcfResult<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read the unsigned magnitude of a varint without zig-zag decoding
pub fn read_magnitude<R: Read + ?Sized>(reader: &mut R) -> OcfResult<u64> {
    let mut magnitude: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = read_byte(reader)?;
        let bits = u64::from(byte & 0x7F);

        // The tenth byte may only carry the single remaining bit.
        if shift == 63 && bits > 1 {
            return Err(OcfError::MalformedVarint {
                max_bytes: MAX_VARINT_LEN,
            });
        }
        magnitude |= bits << shift;

        if byte & 0x80 == 0 {
            return Ok(magnitude);
        }

        shift += 7;
        if shift > 63 {
            return Err(OcfError::MalformedVarint {
                max_bytes: MAX_VARINT_LEN,
            });
        }
    }
}

/// Map an unsigned magnitude back to its signed value
#[inline]
pub const fn zigzag_decode(magnitude: u64) -> i64 {
    ((magnitude >> 1) as i64) ^ -((magnitude & 1) as i64)
}

/// Map a signed value to its zig-zag magnitude
#[inline]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Read one zig-zag encoded long
pub fn read_long<R: Read + ?Sized>(reader: &mut R) -> OcfResult<i64> {
    read_magnitude(reader).map(zigzag_decode)
}

/// Append one zig-zag encoded long to `out`
pub fn write_long(out: &mut Vec<u8>, value: i64) {
    let mut magnitude = zigzag_encode(value);
    loop {
        let mut byte = (magnitude & 0x7F) as u8;
        magnitude >>= 7;
        if magnitude != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if magnitude == 0 {
            break;
        }
    }
}

/// Encode a long into a fresh buffer
pub fn encode_long(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    write_long(&mut out, value);
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(bytes: &[u8]) -> OcfResult<i64> {
        read_long(&mut Cursor::new(bytes))
    }

    #[test]
    fn test_known_encodings() {
        // Reference zig-zag encodings
        assert_eq!(encode_long(0), vec![0x00]);
        assert_eq!(encode_long(-1), vec![0x01]);
        assert_eq!(encode_long(1), vec![0x02]);
        assert_eq!(encode_long(-2), vec![0x03]);
        assert_eq!(encode_long(2), vec![0x04]);
        assert_eq!(encode_long(-64), vec![0x7F]);
        assert_eq!(encode_long(64), vec![0x80, 0x01]);
    }

    #[test]
    fn test_extremes() {
        for value in [0, 1, -1, i64::MAX, i64::MIN, i64::MAX - 1, i64::MIN + 1] {
            let encoded = encode_long(value);
            assert!(encoded.len() <= MAX_VARINT_LEN);
            assert_eq!(decode(&encoded).expect("decode"), value);
        }
        assert_eq!(encode_long(i64::MIN).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_sequential_values_consume_exact_bytes() {
        let mut buf = Vec::new();
        for value in [-100_i64, 200, 0, 300_000] {
            write_long(&mut buf, value);
        }
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_long(&mut cursor).unwrap(), -100);
        assert_eq!(read_long(&mut cursor).unwrap(), 200);
        assert_eq!(read_long(&mut cursor).unwrap(), 0);
        assert_eq!(read_long(&mut cursor).unwrap(), 300_000);
        assert_eq!(cursor.position() as usize, buf.len());
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(decode(&[]), Err(OcfError::UnexpectedEndOfStream)));
    }

    #[test]
    fn test_truncated_continuation() {
        assert!(matches!(
            decode(&[0x80, 0x80]),
            Err(OcfError::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_overlong_encoding_rejected() {
        let bytes = [0xFF; 11];
        assert!(matches!(
            decode(&bytes),
            Err(OcfError::MalformedVarint { max_bytes: 10 })
        ));
    }

    #[test]
    fn test_tenth_byte_overflow_rejected() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        assert!(matches!(
            decode(&bytes),
            Err(OcfError::MalformedVarint { .. })
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn long_round_trip(value in any::<i64>()) {
                let encoded = encode_long(value);
                prop_assert_eq!(decode(&encoded).unwrap(), value);
            }

            #[test]
            fn zigzag_is_bijective(value in any::<i64>()) {
                prop_assert_eq!(zigzag_decode(zigzag_encode(value)), value);
            }

            #[test]
            fn small_magnitudes_stay_short(value in -64_i64..64) {
                prop_assert_eq!(encode_long(value).len(), 1);
            }
        }
    }
}
