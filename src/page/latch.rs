//! Shared access to a frame.
//!
//! Searches read the same slot and tuple bytes that insertion rewrites, so a
//! frame shared between threads sits behind a reader-writer latch: any
//! number of searches, or one insert.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cmp::MultiComparator;
use crate::error::Result;
use crate::page::BTreeFrame;
use crate::slot::{FindTupleMode, NoExactMatchPolicy, SlotSearch};
use crate::tuple::{OwnedTuple, TupleReference};

/// A frame behind a reader-writer latch
#[derive(Clone)]
pub struct LatchedFrame {
    inner: Arc<RwLock<BTreeFrame>>,
}

impl LatchedFrame {
    /// Wrap a frame
    pub fn new(frame: BTreeFrame) -> Self {
        Self {
            inner: Arc::new(RwLock::new(frame)),
        }
    }

    /// Acquire the latch in shared mode
    pub fn read(&self) -> RwLockReadGuard<'_, BTreeFrame> {
        self.inner.read()
    }

    /// Acquire the latch in exclusive mode
    pub fn write(&self) -> RwLockWriteGuard<'_, BTreeFrame> {
        self.inner.write()
    }

    /// Bounded find under a shared latch
    pub fn find<K>(
        &self,
        key: &K,
        cmp: &MultiComparator,
        mode: FindTupleMode,
        policy: NoExactMatchPolicy,
    ) -> Result<SlotSearch>
    where
        K: TupleReference + ?Sized,
    {
        self.read().find(key, cmp, mode, policy)
    }

    /// Unique sorted insert under an exclusive latch
    pub fn insert_sorted(&self, tuple: &OwnedTuple, cmp: &MultiComparator) -> Result<usize> {
        self.write().insert_sorted(tuple, cmp)
    }

    /// Copy of the current page state
    pub fn snapshot(&self) -> BTreeFrame {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotPage;
    use crate::types::FrameConfig;
    use std::thread;

    #[test]
    fn test_concurrent_readers_with_writer() {
        let frame = LatchedFrame::new(BTreeFrame::new(&FrameConfig::default()).unwrap());
        let cmp = MultiComparator::ints(1);
        for k in (0..50).map(|i| i * 2) {
            frame.insert_sorted(&OwnedTuple::new().with_i32(k), &cmp).unwrap();
        }

        thread::scope(|s| {
            for _ in 0..4 {
                let frame = frame.clone();
                let cmp = &cmp;
                s.spawn(move || {
                    for k in (0..50).map(|i| i * 2) {
                        let found = frame
                            .find(
                                &OwnedTuple::new().with_i32(k),
                                cmp,
                                FindTupleMode::Exact,
                                NoExactMatchPolicy::PreferHigherKey,
                            )
                            .unwrap();
                        // Odd keys arriving concurrently only shift even keys right.
                        assert!(matches!(found, SlotSearch::Found(i) if i >= k as usize / 2));
                    }
                });
            }

            let writer = frame.clone();
            let cmp = &cmp;
            s.spawn(move || {
                for k in (0..50).map(|i| i * 2 + 1) {
                    writer.insert_sorted(&OwnedTuple::new().with_i32(k), cmp).unwrap();
                }
            });
        });

        let snapshot = frame.snapshot();
        assert_eq!(snapshot.tuple_count(), 100);
        for i in 0..100 {
            assert_eq!(
                snapshot.tuple(i).unwrap().field(0).unwrap(),
                &(i as i32).to_be_bytes()
            );
        }
    }
}
