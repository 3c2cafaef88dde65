//! Variable-length integer encoding (LEB128) over caller-provided buffers.
//!
//! Tuple headers store field counts and lengths as varints. Encoding writes
//! into a slice and decoding reads from one, so neither allocates.

/// Maximum encoded size of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes `value` occupies when encoded
pub fn varint_size(mut value: u64) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

/// Encode `value` at the start of `buf`.
///
/// Returns the number of bytes written, or `None` if `buf` is too short.
pub fn write_varint(buf: &mut [u8], value: u64) -> Option<usize> {
    if buf.len() < varint_size(value) {
        return None;
    }
    Some(put_varint(buf, value))
}

/// Encode `value` at the start of `buf`, which must hold
/// `varint_size(value)` bytes.
pub(crate) fn put_varint(buf: &mut [u8], mut value: u64) -> usize {
    let size = varint_size(value);
    for byte in buf[..size - 1].iter_mut() {
        *byte = (value as u8 & 0x7F) | 0x80;
        value >>= 7;
    }
    buf[size - 1] = value as u8;
    size
}

/// Decode a varint from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// encoding is truncated or longer than a u64 allows.
pub fn read_varint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;

    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        let shift = 7 * i as u32;
        let low = (byte & 0x7F) as u64;
        if shift == 63 && low > 1 {
            return None;
        }
        value |= low << shift;

        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_use_one_byte() {
        let mut buf = [0u8; MAX_VARINT_LEN];
        assert_eq!(write_varint(&mut buf, 0), Some(1));
        assert_eq!(buf[0], 0);
        assert_eq!(write_varint(&mut buf, 127), Some(1));
        assert_eq!(buf[0], 0x7F);
        assert_eq!(read_varint(&buf), Some((127, 1)));
    }

    #[test]
    fn test_multi_byte_values() {
        let mut buf = [0u8; MAX_VARINT_LEN];
        assert_eq!(write_varint(&mut buf, 300), Some(2));
        assert_eq!(&buf[..2], &[0xAC, 0x02]);
        assert_eq!(read_varint(&buf[..2]), Some((300, 2)));

        let n = write_varint(&mut buf, u64::MAX).unwrap();
        assert_eq!(n, MAX_VARINT_LEN);
        assert_eq!(read_varint(&buf), Some((u64::MAX, MAX_VARINT_LEN)));
    }

    #[test]
    fn test_size_matches_encoding() {
        let mut buf = [0u8; MAX_VARINT_LEN];
        for value in [0, 1, 127, 128, 16_383, 16_384, 1 << 35, u64::MAX] {
            assert_eq!(write_varint(&mut buf, value), Some(varint_size(value)));
        }
    }

    #[test]
    fn test_short_buffer_and_truncated_input() {
        let mut buf = [0u8; 1];
        assert_eq!(write_varint(&mut buf, 128), None);
        assert_eq!(read_varint(&[]), None);
        assert_eq!(read_varint(&[0x80, 0x80]), None);
        assert_eq!(read_varint(&[0xFF; 11]), None);
    }
}
