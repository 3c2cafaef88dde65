//! Slot directory management.
//!
//! A page keeps its tuples in arrival order in the tuple region and keeps a
//! slot directory, growing down from the end of the page, that lists tuple
//! offsets in key order:
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header │ tuple0 │ tuple1 │ tuple2 │ ...  →          │
//! ├────────────────────────────────────────────────────┤
//! │                    Free Space                       │
//! ├────────────────────────────────────────────────────┤
//! │          ←  [slot n-1] ... [slot 1] [slot 0]        │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Slot 0 occupies the last [`SLOT_SIZE`] bytes of the page and refers to the
//! smallest key. The cell for the greatest key sits at the slot region edge,
//! next to free space.

mod ordered;

pub use ordered::OrderedSlotManager;

use crate::cmp::MultiComparator;
use crate::error::{Result, StorageError};
use crate::tuple::{TupleCursor, TupleReference};
use crate::types::SLOT_SIZE;

/// Raw encoding of [`SlotSearch::GreatestKey`]
pub const GREATEST_KEY_INDICATOR: i32 = -1;

/// Raw encoding of [`SlotSearch::Violation`]
pub const ERROR_INDICATOR: i32 = -2;

/// What a bounded search does when it meets a key equal to the search key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindTupleMode {
    /// Return the match; anything else is a violation
    Exact,
    /// Return the match; otherwise fall back to the no-exact-match policy
    Inclusive,
    /// Skip past the match in the policy's direction
    Exclusive,
    /// Any match is a violation (uniqueness probe before insert)
    ExclusiveErrorIfExists,
}

/// Which neighbor a bounded search reports when no key matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoExactMatchPolicy {
    /// Smallest key strictly greater than the search key
    PreferHigherKey,
    /// Greatest key strictly less than the search key
    PreferLowerKey,
}

/// Outcome of a bounded find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSearch {
    /// The tuple at this index equals the search key
    Found(usize),
    /// No match was returned; this is the neighboring index chosen by the
    /// no-exact-match policy
    Neighbor(usize),
    /// No index satisfies the policy. Under `PreferHigherKey` this means the
    /// key sorts after every tuple and belongs at the end of the page.
    GreatestKey,
    /// The mode's match requirement failed: a match under
    /// `ExclusiveErrorIfExists`, or no match under `Exact`
    Violation,
}

impl SlotSearch {
    /// Index carried by `Found` or `Neighbor`
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Found(i) | Self::Neighbor(i) => Some(i),
            Self::GreatestKey | Self::Violation => None,
        }
    }

    /// Where a slot for the search key goes, for searches made with
    /// `PreferHigherKey`
    pub fn insert_position(self) -> Option<SlotPosition> {
        match self {
            Self::Found(i) | Self::Neighbor(i) => Some(SlotPosition::Index(i)),
            Self::GreatestKey => Some(SlotPosition::GreatestKey),
            Self::Violation => None,
        }
    }

    /// Integer encoding: indices map to themselves, `GreatestKey` to
    /// [`GREATEST_KEY_INDICATOR`], `Violation` to [`ERROR_INDICATOR`]
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Found(i) | Self::Neighbor(i) => i as i32,
            Self::GreatestKey => GREATEST_KEY_INDICATOR,
            Self::Violation => ERROR_INDICATOR,
        }
    }
}

/// Outcome of a hinted find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintedSearch {
    /// The tuple at this index equals the search key
    Found(usize),
    /// No tuple equals the key; it would sort at `insertion`
    Absent { insertion: usize },
}

impl HintedSearch {
    /// Signed insertion point encoding: `i` when found, `-(insertion) - 1`
    /// otherwise
    pub fn to_signed(self) -> i64 {
        match self {
            Self::Found(i) => i as i64,
            Self::Absent { insertion } => -(insertion as i64) - 1,
        }
    }

    /// Inverse of [`HintedSearch::to_signed`]
    pub fn from_signed(value: i64) -> Self {
        if value >= 0 {
            Self::Found(value as usize)
        } else {
            Self::Absent {
                insertion: (-(value + 1)) as usize,
            }
        }
    }

    /// Index to continue from on the next, larger key
    pub fn next_hint(self) -> usize {
        match self {
            Self::Found(i) => i,
            Self::Absent { insertion } => insertion,
        }
    }
}

/// Where [`SlotManager::insert_slot`] places a new cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPosition {
    /// Before the tuple currently at this logical index
    Index(usize),
    /// After every existing tuple, at the slot region edge
    GreatestKey,
}

/// Page seam used by the slot manager and tuple cursors.
///
/// Implementors expose raw bytes, the live tuple count and the bounds of the
/// tuple region. Slot geometry is derived from those.
pub trait SlotPage {
    /// Raw page bytes
    fn as_bytes(&self) -> &[u8];

    /// Raw page bytes, mutable
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Number of live tuples (and slots)
    fn tuple_count(&self) -> usize;

    /// First byte of the tuple region (end of the header)
    fn tuple_region_start(&self) -> usize;

    /// One past the last byte of the tuple region
    fn tuple_region_end(&self) -> usize;

    /// Byte offset of the cell for logical index `index`.
    ///
    /// `index == tuple_count()` names the cell just past the current edge.
    fn slot_cell_offset(&self, index: usize) -> Result<usize> {
        let count = self.tuple_count();
        if index > count {
            return Err(StorageError::SlotOutOfBounds { index, count });
        }
        (index + 1)
            .checked_mul(SLOT_SIZE)
            .and_then(|width| self.as_bytes().len().checked_sub(width))
            .ok_or_else(|| StorageError::corruption("slot directory larger than page"))
    }

    /// Current innermost boundary of the slot region
    fn slot_region_edge(&self) -> usize {
        self.as_bytes()
            .len()
            .saturating_sub(self.tuple_count() * SLOT_SIZE)
    }

    /// Tuple offset stored in the cell for `index`
    fn tuple_offset(&self, index: usize) -> Result<usize> {
        let count = self.tuple_count();
        if index >= count {
            return Err(StorageError::SlotOutOfBounds { index, count });
        }
        let cell = self.slot_cell_offset(index)?;
        let bytes = self.as_bytes();
        let off = u32::from_be_bytes([bytes[cell], bytes[cell + 1], bytes[cell + 2], bytes[cell + 3]])
            as usize;
        if off < self.tuple_region_start() || off >= self.tuple_region_end() {
            return Err(StorageError::corruption(format!(
                "slot {} points at offset {} outside tuple region [{}, {})",
                index,
                off,
                self.tuple_region_start(),
                self.tuple_region_end()
            )));
        }
        Ok(off)
    }

    /// Write `tuple_off` into the cell at byte offset `cell_off`
    fn set_slot_cell(&mut self, cell_off: usize, tuple_off: usize) -> Result<()> {
        let value = u32::try_from(tuple_off)
            .map_err(|_| StorageError::invalid_page(format!("tuple offset {} exceeds u32", tuple_off)))?;
        let bytes = self.as_bytes_mut();
        if cell_off + SLOT_SIZE > bytes.len() {
            return Err(StorageError::invalid_page(format!(
                "slot cell at {} beyond page end",
                cell_off
            )));
        }
        bytes[cell_off..cell_off + SLOT_SIZE].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

/// Search and maintenance operations over a page's slot directory
pub trait SlotManager {
    /// Binary search over every tuple on the page.
    ///
    /// Compares against the last tuple first so that appends skip the
    /// binary search entirely.
    fn find_tuple_index<'p, P, K, C>(
        &self,
        page: &'p P,
        key: &K,
        cursor: &mut C,
        cmp: &MultiComparator,
        mode: FindTupleMode,
        policy: NoExactMatchPolicy,
    ) -> Result<SlotSearch>
    where
        P: SlotPage + ?Sized,
        K: TupleReference + ?Sized,
        C: TupleCursor<'p>;

    /// Exponential search forward from `hint`, then binary search within the
    /// bracket it finds
    fn find_tuple_index_from<'p, P, K, C>(
        &self,
        page: &'p P,
        key: &K,
        cursor: &mut C,
        cmp: &MultiComparator,
        hint: usize,
    ) -> Result<HintedSearch>
    where
        P: SlotPage + ?Sized,
        K: TupleReference + ?Sized,
        C: TupleCursor<'p>;

    /// Open a cell at `position` and store `tuple_off` in it.
    ///
    /// The tuple count is not changed; the caller bumps it afterwards.
    /// Returns the byte offset of the cell written.
    fn insert_slot<P>(&self, page: &mut P, position: SlotPosition, tuple_off: usize) -> Result<usize>
    where
        P: SlotPage + ?Sized;
}
