//! Cursor over page-resident tuples.

use std::ops::Range;

use crate::error::Result;
use crate::slot::SlotPage;
use crate::tuple::{field_out_of_range, parse_fields, TupleCursor, TupleReference};

/// Reusable cursor that reads a tuple in place on a page.
///
/// Resetting re-parses the tuple header into a field table that is kept
/// between resets, so repeated probes during a search do not allocate once
/// the table has grown to the widest tuple seen.
#[derive(Debug, Clone, Default)]
pub struct FrameTuple<'p> {
    buf: &'p [u8],
    tuple_off: usize,
    tuple_len: usize,
    fields: Vec<Range<usize>>,
}

impl<'p> FrameTuple<'p> {
    /// Create a cursor that is not yet positioned on any tuple
    pub fn new() -> Self {
        Self {
            buf: &[],
            tuple_off: 0,
            tuple_len: 0,
            fields: Vec::new(),
        }
    }

    /// Byte offset of the current tuple within the page
    pub fn tuple_offset(&self) -> usize {
        self.tuple_off
    }

    /// Encoded length of the current tuple
    pub fn tuple_len(&self) -> usize {
        self.tuple_len
    }

    /// Encoded bytes of the current tuple
    pub fn as_bytes(&self) -> &'p [u8] {
        &self.buf[self.tuple_off..self.tuple_off + self.tuple_len]
    }
}

impl<'p> TupleCursor<'p> for FrameTuple<'p> {
    fn reset_by_tuple_index<P>(&mut self, page: &'p P, index: usize) -> Result<()>
    where
        P: SlotPage + ?Sized,
    {
        let off = page.tuple_offset(index)?;
        let buf = page.as_bytes();
        let region = &buf[off..page.tuple_region_end()];

        self.tuple_len = parse_fields(region, off, &mut self.fields)?;
        self.buf = buf;
        self.tuple_off = off;
        Ok(())
    }
}

impl TupleReference for FrameTuple<'_> {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field(&self, index: usize) -> Result<&[u8]> {
        self.fields
            .get(index)
            .map(|r| &self.buf[r.clone()])
            .ok_or_else(|| field_out_of_range(index, self.fields.len()))
    }
}
