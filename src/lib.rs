//! # BTree Frame
//!
//! In-page tuple layout for B-tree leaf pages: ordered search over a packed
//! slot directory and ordered slot insertion, directly over page bytes.
//!
//! ## Architecture
//!
//! - **Slot Layer** (`slot`): the ordered slot manager, its page seam and
//!   search result types
//! - **Page Layer** (`page`): leaf frames over fixed-size page buffers
//! - **Tuple Layer** (`tuple`): tuple encoding and the in-place page cursor
//! - **Comparators** (`cmp`): per-field and multi-field key ordering
//!
//! ## Usage
//!
//! ```rust,ignore
//! use btree_frame::{BTreeFrame, FrameConfig, MultiComparator, OwnedTuple};
//! use btree_frame::{FindTupleMode, NoExactMatchPolicy, SlotSearch};
//!
//! let mut frame = BTreeFrame::new(&FrameConfig::default())?;
//! let cmp = MultiComparator::ints(1);
//!
//! for k in [30, 10, 20] {
//!     frame.insert_sorted(&OwnedTuple::new().with_i32(k), &cmp)?;
//! }
//!
//! let hit = frame.find(
//!     &OwnedTuple::new().with_i32(20),
//!     &cmp,
//!     FindTupleMode::Exact,
//!     NoExactMatchPolicy::PreferHigherKey,
//! )?;
//! assert_eq!(hit, SlotSearch::Found(1));
//!
//! // -(insertion point) - 1
//! let miss = frame.find_from_hint(&OwnedTuple::new().with_i32(25), &cmp, 0)?;
//! assert_eq!(miss.to_signed(), -3);
//! ```

pub mod cmp;
pub mod error;
pub mod page;
pub mod slot;
pub mod tuple;
pub mod types;

pub use cmp::{FieldComparator, MultiComparator};
pub use error::{Result, StorageError};
pub use page::{BTreeFrame, LatchedFrame};
pub use slot::{
    FindTupleMode, HintedSearch, NoExactMatchPolicy, OrderedSlotManager, SlotManager, SlotPage,
    SlotPosition, SlotSearch,
};
pub use tuple::{FrameTuple, OwnedTuple, TupleCursor, TupleRef, TupleReference};
pub use types::{FrameConfig, PAGE_SIZE, SLOT_SIZE};
