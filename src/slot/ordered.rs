//! Slot manager for pages whose slot directory is kept in key order.

use std::cmp::Ordering;

use crate::cmp::MultiComparator;
use crate::error::{Result, StorageError};
use crate::slot::{
    FindTupleMode, HintedSearch, NoExactMatchPolicy, SlotManager, SlotPage, SlotPosition,
    SlotSearch,
};
use crate::tuple::{TupleCursor, TupleReference};
use crate::types::SLOT_SIZE;

/// Stateless slot manager; all structural state lives in the page
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedSlotManager;

impl SlotManager for OrderedSlotManager {
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
        C: TupleCursor<'p>,
    {
        let tuple_count = page.tuple_count();
        if tuple_count == 0 {
            return Ok(SlotSearch::GreatestKey);
        }

        let last = tuple_count as isize - 1;
        let mut end = last;

        // Appends land past the last key; skip the binary search for them.
        cursor.reset_by_tuple_index(page, last as usize)?;
        let mut begin = if cmp.compare(key, cursor)? == Ordering::Greater {
            tuple_count as isize
        } else {
            0
        };

        while begin <= end {
            let mid = (begin + end) / 2;
            cursor.reset_by_tuple_index(page, mid as usize)?;

            match cmp.compare(key, cursor)? {
                Ordering::Less => end = mid - 1,
                Ordering::Greater => begin = mid + 1,
                Ordering::Equal => match mode {
                    FindTupleMode::Exclusive => match policy {
                        NoExactMatchPolicy::PreferHigherKey => begin = mid + 1,
                        NoExactMatchPolicy::PreferLowerKey => end = mid - 1,
                    },
                    FindTupleMode::ExclusiveErrorIfExists => return Ok(SlotSearch::Violation),
                    FindTupleMode::Exact | FindTupleMode::Inclusive => {
                        return Ok(SlotSearch::Found(mid as usize))
                    }
                },
            }
        }

        if mode == FindTupleMode::Exact {
            return Ok(SlotSearch::Violation);
        }

        // The bound is re-checked against the tuple it names before it is
        // reported.
        match policy {
            NoExactMatchPolicy::PreferHigherKey => {
                if begin > last {
                    return Ok(SlotSearch::GreatestKey);
                }
                cursor.reset_by_tuple_index(page, begin as usize)?;
                if cmp.compare(key, cursor)? == Ordering::Less {
                    Ok(SlotSearch::Neighbor(begin as usize))
                } else {
                    Ok(SlotSearch::GreatestKey)
                }
            }
            NoExactMatchPolicy::PreferLowerKey => {
                if end < 0 {
                    return Ok(SlotSearch::GreatestKey);
                }
                cursor.reset_by_tuple_index(page, end as usize)?;
                if cmp.compare(key, cursor)? == Ordering::Greater {
                    Ok(SlotSearch::Neighbor(end as usize))
                } else {
                    Ok(SlotSearch::GreatestKey)
                }
            }
        }
    }

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
        C: TupleCursor<'p>,
    {
        let tuple_count = page.tuple_count();
        if tuple_count == 0 {
            return Ok(HintedSearch::Absent { insertion: 0 });
        }
        if hint >= tuple_count {
            return Ok(HintedSearch::Absent {
                insertion: tuple_count,
            });
        }

        let mut step = 1;
        let mut index = hint;
        let mut prev_index = hint;

        // Gallop forward until a key >= the search key brackets it.
        loop {
            cursor.reset_by_tuple_index(page, index)?;
            match cmp.compare(key, cursor)? {
                Ordering::Equal => return Ok(HintedSearch::Found(index)),
                Ordering::Greater => {
                    prev_index = index;
                    if index + step < tuple_count {
                        index += step;
                        step <<= 1;
                    } else if index == tuple_count - 1 {
                        return Ok(HintedSearch::Absent {
                            insertion: tuple_count,
                        });
                    } else {
                        index = tuple_count - 1;
                    }
                }
                Ordering::Less => break,
            }
        }

        if index == hint {
            return Ok(HintedSearch::Absent { insertion: index });
        }

        // prev_index < target < index
        let mut low = prev_index + 1;
        let mut high = index;
        while low < high {
            let mid = low + (high - low) / 2;
            cursor.reset_by_tuple_index(page, mid)?;
            match cmp.compare(key, cursor)? {
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => return Ok(HintedSearch::Found(mid)),
            }
        }

        Ok(HintedSearch::Absent { insertion: low })
    }

    fn insert_slot<P>(&self, page: &mut P, position: SlotPosition, tuple_off: usize) -> Result<usize>
    where
        P: SlotPage + ?Sized,
    {
        let region_start = page.tuple_region_start();
        let region_end = page.tuple_region_end();
        if tuple_off < region_start || tuple_off >= region_end {
            return Err(StorageError::corruption(format!(
                "tuple offset {} outside tuple region [{}, {})",
                tuple_off, region_start, region_end
            )));
        }

        let edge = page.slot_region_edge();
        let available = edge.saturating_sub(region_end);
        if available < SLOT_SIZE {
            return Err(StorageError::PageFull {
                needed: SLOT_SIZE,
                available,
            });
        }
        let new_edge = edge - SLOT_SIZE;

        let slot_off = match position {
            SlotPosition::GreatestKey => new_edge,
            SlotPosition::Index(index) => {
                let slot_off = page.slot_cell_offset(index)?;
                // Cells [edge, slot_off + SLOT_SIZE) move one cell toward
                // free space, leaving the cell at slot_off open.
                let len = slot_off + SLOT_SIZE - edge;
                page.as_bytes_mut().copy_within(edge..edge + len, new_edge);
                slot_off
            }
        };
        page.set_slot_cell(slot_off, tuple_off)?;

        tracing::trace!(
            target: "btree_frame::slot",
            ?position,
            slot_off,
            tuple_off,
            tuple_count = page.tuple_count(),
            "inserted slot"
        );
        Ok(slot_off)
    }
}
