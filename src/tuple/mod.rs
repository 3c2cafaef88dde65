//! Tuple encoding and tuple references.
//!
//! A tuple is a sequence of byte fields. On a page it is stored as:
//! ```text
//! [field_count: varint][len_0: varint]...[len_n-1: varint][field_0]...[field_n-1]
//! ```
//! Integer fields are big-endian two's complement.

mod frame_tuple;

pub use frame_tuple::FrameTuple;

use std::ops::Range;

use crate::error::{Result, StorageError};
use crate::slot::SlotPage;
use crate::types::{put_varint, read_varint, varint_size};

/// Read access to the fields of a tuple
pub trait TupleReference {
    /// Number of fields
    fn field_count(&self) -> usize;

    /// Bytes of field `index`
    fn field(&self, index: usize) -> Result<&[u8]>;
}

/// A tuple reference that can be re-pointed at the tuple in a page slot
/// without copying it
pub trait TupleCursor<'p>: TupleReference {
    /// Position on the tuple stored at logical slot `index` of `page`
    fn reset_by_tuple_index<P>(&mut self, page: &'p P, index: usize) -> Result<()>
    where
        P: SlotPage + ?Sized;
}

/// A tuple that owns its fields; used for search keys and for building
/// tuples before they are written to a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedTuple {
    fields: Vec<Vec<u8>>,
}

impl OwnedTuple {
    /// Create an empty tuple
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tuple from raw fields
    pub fn from_fields(fields: Vec<Vec<u8>>) -> Self {
        Self { fields }
    }

    /// Append a raw byte field
    pub fn with_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.fields.push(bytes.as_ref().to_vec());
        self
    }

    /// Append an i32 field
    pub fn with_i32(self, value: i32) -> Self {
        self.with_bytes(value.to_be_bytes())
    }

    /// Append an i64 field
    pub fn with_i64(self, value: i64) -> Self {
        self.with_bytes(value.to_be_bytes())
    }

    /// Append a UTF-8 string field
    pub fn with_str(self, value: &str) -> Self {
        self.with_bytes(value.as_bytes())
    }

    /// Size of the encoded tuple in bytes
    pub fn encoded_len(&self) -> usize {
        let header: usize = varint_size(self.fields.len() as u64)
            + self
                .fields
                .iter()
                .map(|f| varint_size(f.len() as u64))
                .sum::<usize>();
        header + self.fields.iter().map(Vec::len).sum::<usize>()
    }

    /// Encode into the start of `buf`, returning the number of bytes written
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let needed = self.encoded_len();
        if buf.len() < needed {
            return Err(StorageError::PageFull {
                needed,
                available: buf.len(),
            });
        }

        Ok(self.write_encoded(buf))
    }

    /// Encode into a new buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.write_encoded(&mut buf);
        buf
    }

    /// Write the encoding into `buf`, which holds at least `encoded_len()` bytes
    fn write_encoded(&self, buf: &mut [u8]) -> usize {
        let mut pos = put_varint(buf, self.fields.len() as u64);
        for field in &self.fields {
            pos += put_varint(&mut buf[pos..], field.len() as u64);
        }
        for field in &self.fields {
            buf[pos..pos + field.len()].copy_from_slice(field);
            pos += field.len();
        }
        pos
    }
}

impl TupleReference for OwnedTuple {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field(&self, index: usize) -> Result<&[u8]> {
        self.fields
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| field_out_of_range(index, self.fields.len()))
    }
}

/// A decoded view over an encoded tuple
#[derive(Debug, Clone)]
pub struct TupleRef<'a> {
    bytes: &'a [u8],
    fields: Vec<Range<usize>>,
}

impl<'a> TupleRef<'a> {
    /// Parse the tuple at the start of `bytes`.
    ///
    /// Trailing bytes after the tuple are ignored.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut fields = Vec::new();
        let len = parse_fields(bytes, 0, &mut fields)?;
        Ok(Self {
            bytes: &bytes[..len],
            fields,
        })
    }

    /// The encoded bytes of this tuple
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copy the fields out into an owned tuple
    pub fn to_owned_tuple(&self) -> OwnedTuple {
        OwnedTuple::from_fields(
            self.fields
                .iter()
                .map(|r| self.bytes[r.clone()].to_vec())
                .collect(),
        )
    }
}

impl TupleReference for TupleRef<'_> {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field(&self, index: usize) -> Result<&[u8]> {
        self.fields
            .get(index)
            .map(|r| &self.bytes[r.clone()])
            .ok_or_else(|| field_out_of_range(index, self.fields.len()))
    }
}

/// Decode the tuple header at the start of `bytes` into `fields`.
///
/// Field ranges are shifted by `base`. Returns the encoded tuple length.
pub(crate) fn parse_fields(bytes: &[u8], base: usize, fields: &mut Vec<Range<usize>>) -> Result<usize> {
    fields.clear();

    let (count, mut pos) =
        read_varint(bytes).ok_or_else(|| StorageError::corruption("truncated tuple header"))?;
    // Every field needs at least one length byte.
    if count > bytes.len() as u64 {
        return Err(StorageError::corruption(format!(
            "tuple claims {} fields in {} bytes",
            count,
            bytes.len()
        )));
    }

    let mut data_len: usize = 0;
    for _ in 0..count {
        let (len, n) = read_varint(&bytes[pos..])
            .ok_or_else(|| StorageError::corruption("truncated tuple header"))?;
        pos += n;
        let start = data_len;
        data_len = usize::try_from(len)
            .ok()
            .and_then(|len| data_len.checked_add(len))
            .ok_or_else(|| StorageError::corruption("tuple field length overflow"))?;
        fields.push(start..data_len);
    }

    let total = pos
        .checked_add(data_len)
        .filter(|&total| total <= bytes.len())
        .ok_or_else(|| {
            StorageError::corruption(format!(
                "tuple of {} bytes runs past {} available",
                pos.saturating_add(data_len),
                bytes.len()
            ))
        })?;

    for range in fields.iter_mut() {
        *range = base + pos + range.start..base + pos + range.end;
    }

    Ok(total)
}

fn field_out_of_range(index: usize, count: usize) -> StorageError {
    StorageError::corruption(format!("field {} out of range ({} fields)", index, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_and_parse() {
        let tuple = OwnedTuple::new().with_i32(7).with_str("seven").with_bytes([]);
        let encoded = tuple.encode();
        assert_eq!(encoded.len(), tuple.encoded_len());
        assert_eq!(&encoded[..4], &[3, 4, 5, 0]);

        let parsed = TupleRef::parse(&encoded).unwrap();
        assert_eq!(parsed.field_count(), 3);
        assert_eq!(parsed.field(0).unwrap(), &7i32.to_be_bytes());
        assert_eq!(parsed.field(1).unwrap(), b"seven");
        assert!(parsed.field(2).unwrap().is_empty());
        assert_eq!(parsed.to_owned_tuple(), tuple);
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let mut encoded = OwnedTuple::new().with_str("ab").encode();
        let len = encoded.len();
        encoded.extend_from_slice(&[0xFF, 0xFF]);
        let parsed = TupleRef::parse(&encoded).unwrap();
        assert_eq!(parsed.as_bytes().len(), len);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TupleRef::parse(&[]).is_err());
        // Two fields declared, one length present.
        assert!(TupleRef::parse(&[2, 1]).is_err());
        // Field length runs past the buffer.
        assert!(TupleRef::parse(&[1, 9, b'a']).is_err());
        // Absurd field count.
        assert!(TupleRef::parse(&[0xFF, 0xFF, 0x03]).is_err());
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let tuple = OwnedTuple::new().with_i64(1);
        let mut buf = [0u8; 4];
        assert!(matches!(
            tuple.encode_into(&mut buf),
            Err(StorageError::PageFull { needed: 10, available: 4 })
        ));
    }

    #[test]
    fn test_encode_into_matches_encode() {
        let tuple = OwnedTuple::new().with_bytes(vec![7u8; 200]).with_i32(-1);
        let encoded = tuple.encode();
        // Two-byte length varint for the 200-byte field.
        assert_eq!(&encoded[..4], &[2, 0xC8, 0x01, 4]);

        let mut buf = [0xAAu8; 256];
        let written = tuple.encode_into(&mut buf).unwrap();
        assert_eq!(written, encoded.len());
        assert_eq!(&buf[..written], encoded.as_slice());
        assert_eq!(buf[written], 0xAA);
    }

    #[test]
    fn test_field_out_of_range() {
        let tuple = OwnedTuple::new().with_i32(1);
        assert!(tuple.field(1).is_err());
    }
}
