//! Key comparison.
//!
//! A [`MultiComparator`] orders a search key against a tuple by comparing
//! fields pairwise with one [`FieldComparator`] per key field, stopping at
//! the first field that differs.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, StorageError};
use crate::tuple::TupleReference;

/// Ordering over the bytes of a single field
pub trait FieldComparator: Send + Sync {
    /// Compare two encoded field values.
    ///
    /// Fails when either value is not a valid encoding for this comparator.
    fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering>;

    /// Name used in debug output
    fn name(&self) -> &'static str;
}

/// Lexicographic byte order
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesComparator;

impl FieldComparator for BytesComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        Ok(a.cmp(b))
    }

    fn name(&self) -> &'static str {
        "bytes"
    }
}

/// Signed order over 4-byte big-endian integers
#[derive(Debug, Clone, Copy, Default)]
pub struct IntComparator;

impl FieldComparator for IntComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        Ok(decode_i32(a)?.cmp(&decode_i32(b)?))
    }

    fn name(&self) -> &'static str {
        "int"
    }
}

/// Signed order over 8-byte big-endian integers
#[derive(Debug, Clone, Copy, Default)]
pub struct LongComparator;

impl FieldComparator for LongComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        Ok(decode_i64(a)?.cmp(&decode_i64(b)?))
    }

    fn name(&self) -> &'static str {
        "long"
    }
}

/// Code point order over UTF-8 strings; rejects invalid UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Comparator;

impl FieldComparator for Utf8Comparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        let a = std::str::from_utf8(a).map_err(|e| StorageError::comparator(e.to_string()))?;
        let b = std::str::from_utf8(b).map_err(|e| StorageError::comparator(e.to_string()))?;
        Ok(a.cmp(b))
    }

    fn name(&self) -> &'static str {
        "utf8"
    }
}

fn decode_i32(bytes: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| StorageError::comparator(format!("int field has {} bytes", bytes.len())))?;
    Ok(i32::from_be_bytes(arr))
}

fn decode_i64(bytes: &[u8]) -> Result<i64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::comparator(format!("long field has {} bytes", bytes.len())))?;
    Ok(i64::from_be_bytes(arr))
}

/// Field-by-field comparator over multi-field keys
pub struct MultiComparator {
    fields: Vec<Box<dyn FieldComparator>>,
}

impl MultiComparator {
    /// Create a comparator from per-field comparators, in key order
    pub fn new(fields: Vec<Box<dyn FieldComparator>>) -> Self {
        Self { fields }
    }

    /// `n` int fields
    pub fn ints(n: usize) -> Self {
        Self::new((0..n).map(|_| Box::new(IntComparator) as Box<dyn FieldComparator>).collect())
    }

    /// `n` long fields
    pub fn longs(n: usize) -> Self {
        Self::new((0..n).map(|_| Box::new(LongComparator) as Box<dyn FieldComparator>).collect())
    }

    /// `n` raw byte fields
    pub fn bytes(n: usize) -> Self {
        Self::new((0..n).map(|_| Box::new(BytesComparator) as Box<dyn FieldComparator>).collect())
    }

    /// Append a comparator for the next key field
    pub fn with_field(mut self, cmp: impl FieldComparator + 'static) -> Self {
        self.fields.push(Box::new(cmp));
        self
    }

    /// Number of key fields this comparator covers
    pub fn key_field_count(&self) -> usize {
        self.fields.len()
    }

    /// Compare `key` against `tuple`.
    ///
    /// Only the leading fields covered by both the key and this comparator
    /// take part, so a shorter key acts as a prefix.
    pub fn compare<K, T>(&self, key: &K, tuple: &T) -> Result<Ordering>
    where
        K: TupleReference + ?Sized,
        T: TupleReference + ?Sized,
    {
        let n = key.field_count().min(self.fields.len());
        for (i, cmp) in self.fields.iter().take(n).enumerate() {
            match cmp.compare(key.field(i)?, tuple.field(i)?)? {
                Ordering::Equal => continue,
                other => return Ok(other),
            }
        }
        Ok(Ordering::Equal)
    }
}

impl fmt::Debug for MultiComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::OwnedTuple;

    #[test]
    fn test_int_comparator_is_signed() {
        let cmp = IntComparator;
        assert_eq!(
            cmp.compare(&(-1i32).to_be_bytes(), &1i32.to_be_bytes()).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            cmp.compare(&i32::MAX.to_be_bytes(), &i32::MIN.to_be_bytes()).unwrap(),
            Ordering::Greater
        );
        assert!(cmp.compare(b"abc", &1i32.to_be_bytes()).is_err());
    }

    #[test]
    fn test_long_and_utf8() {
        assert_eq!(
            LongComparator
                .compare(&5i64.to_be_bytes(), &5i64.to_be_bytes())
                .unwrap(),
            Ordering::Equal
        );
        assert!(LongComparator.compare(&5i32.to_be_bytes(), &5i64.to_be_bytes()).is_err());
        assert_eq!(Utf8Comparator.compare(b"apple", b"banana").unwrap(), Ordering::Less);
        assert!(matches!(
            Utf8Comparator.compare(&[0xC3, 0x28], b"a"),
            Err(StorageError::Comparator(_))
        ));
    }

    #[test]
    fn test_ties_broken_field_by_field() {
        let cmp = MultiComparator::ints(1).with_field(Utf8Comparator);
        let a = OwnedTuple::new().with_i32(1).with_str("b");
        let b = OwnedTuple::new().with_i32(1).with_str("c");
        let c = OwnedTuple::new().with_i32(2).with_str("a");
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(cmp.compare(&c, &b).unwrap(), Ordering::Greater);
        assert_eq!(cmp.compare(&a, &a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_prefix_key() {
        let cmp = MultiComparator::ints(2);
        let prefix = OwnedTuple::new().with_i32(3);
        let full = OwnedTuple::new().with_i32(3).with_i32(9);
        assert_eq!(cmp.compare(&prefix, &full).unwrap(), Ordering::Equal);
        assert_eq!(cmp.key_field_count(), 2);
        assert_eq!(format!("{:?}", cmp), r#"["int", "int"]"#);
    }
}
