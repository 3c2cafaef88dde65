//! Leaf frame implementation.
//!
//! A [`BTreeFrame`] owns one page buffer and keeps its header in sync with
//! it. Tuples are appended to the tuple region in arrival order; their key
//! order lives only in the slot directory, maintained by
//! [`OrderedSlotManager`].

use serde::Serialize;

use crate::cmp::MultiComparator;
use crate::error::{Result, StorageError};
use crate::page::header::CHECKSUM_OFFSET;
use crate::page::{FrameHeader, PageBuf, FLAG_SEALED, HEADER_SIZE};
use crate::slot::{
    FindTupleMode, HintedSearch, NoExactMatchPolicy, OrderedSlotManager, SlotManager, SlotPage,
    SlotPosition, SlotSearch,
};
use crate::tuple::{FrameTuple, OwnedTuple, TupleRef, TupleReference};
use crate::types::{FrameConfig, SLOT_SIZE};

/// A leaf page holding tuples in key order
pub struct BTreeFrame {
    /// The raw page data
    data: PageBuf,
    /// Cached header (kept in sync with data)
    header: FrameHeader,
}

impl BTreeFrame {
    /// Create a new empty leaf frame
    pub fn new(config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        let mut data = PageBuf::new(config.page_size);
        let header = FrameHeader::new_leaf();
        header.write(&mut data);
        Ok(Self { data, header })
    }

    /// Load a frame from raw bytes, validating its header and geometry
    pub fn from_bytes(bytes: &[u8], config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        if bytes.len() != config.page_size {
            return Err(StorageError::invalid_page(format!(
                "page is {} bytes, expected {}",
                bytes.len(),
                config.page_size
            )));
        }

        let header = FrameHeader::read(bytes)
            .ok_or_else(|| StorageError::invalid_page("invalid frame header"))?;
        let frame = Self {
            data: PageBuf::from_bytes(bytes),
            header,
        };

        if let Err(e) = frame.validate_geometry() {
            tracing::debug!(target: "btree_frame::frame", error = %e, "rejected page geometry");
            return Err(e);
        }
        if config.verify_checksums {
            frame.verify_checksum()?;
        }

        Ok(frame)
    }

    fn validate_geometry(&self) -> Result<()> {
        let page_size = self.data.len();
        let free = self.header.free_space_off as usize;
        if free < HEADER_SIZE || free > page_size {
            return Err(StorageError::invalid_page(format!(
                "free space offset {} outside [{}, {}]",
                free, HEADER_SIZE, page_size
            )));
        }

        let fits = (self.header.tuple_count as usize)
            .checked_mul(SLOT_SIZE)
            .map_or(false, |slot_bytes| slot_bytes <= page_size - free);
        if !fits {
            return Err(StorageError::invalid_page(format!(
                "{} slots overlap the tuple region ending at {}",
                self.header.tuple_count, free
            )));
        }

        if !self.header.is_leaf() {
            return Err(StorageError::invalid_page(format!(
                "level {} is not a leaf",
                self.header.level
            )));
        }
        Ok(())
    }

    /// Get the frame header
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.data.len()
    }

    /// Offset one past the tuple region
    pub fn free_space_off(&self) -> usize {
        self.header.free_space_off as usize
    }

    /// Bytes between the tuple region and the slot region
    pub fn free_space(&self) -> usize {
        self.slot_region_edge().saturating_sub(self.free_space_off())
    }

    /// Check if an encoded tuple of `tuple_len` bytes and its slot fit
    pub fn can_fit(&self, tuple_len: usize) -> bool {
        self.free_space() >= tuple_len + SLOT_SIZE
    }

    /// Bounded find over the whole page
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
        let mut cursor = FrameTuple::new();
        OrderedSlotManager.find_tuple_index(self, key, &mut cursor, cmp, mode, policy)
    }

    /// Hinted find starting at logical index `hint`
    pub fn find_from_hint<K>(&self, key: &K, cmp: &MultiComparator, hint: usize) -> Result<HintedSearch>
    where
        K: TupleReference + ?Sized,
    {
        let mut cursor = FrameTuple::new();
        OrderedSlotManager.find_tuple_index_from(self, key, &mut cursor, cmp, hint)
    }

    /// Look up keys given in ascending order, starting each probe where the
    /// previous one ended.
    ///
    /// Keys out of order still get an answer, but a key below the previous
    /// result reports an insertion point at that result instead of its true
    /// position.
    pub fn lookup_sorted<K>(&self, keys: &[K], cmp: &MultiComparator) -> Result<Vec<HintedSearch>>
    where
        K: TupleReference,
    {
        let mut cursor = FrameTuple::new();
        let mut hint = 0;
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let result = OrderedSlotManager.find_tuple_index_from(self, key, &mut cursor, cmp, hint)?;
            hint = result.next_hint();
            results.push(result);
        }
        Ok(results)
    }

    /// Find where a new unique key goes
    ///
    /// Fails with [`StorageError::DuplicateKey`] if an equal key is present.
    pub fn find_insert_position<K>(&self, key: &K, cmp: &MultiComparator) -> Result<SlotPosition>
    where
        K: TupleReference + ?Sized,
    {
        let search = self.find(
            key,
            cmp,
            FindTupleMode::ExclusiveErrorIfExists,
            NoExactMatchPolicy::PreferHigherKey,
        )?;
        search.insert_position().ok_or(StorageError::DuplicateKey)
    }

    /// Write `tuple` to the tuple region and give it a slot at `position`.
    ///
    /// The caller chooses a position that keeps keys in order; this is not
    /// checked. Returns the tuple's logical index.
    pub fn insert(&mut self, tuple: &OwnedTuple, position: SlotPosition) -> Result<usize> {
        let tuple_len = tuple.encoded_len();
        if !self.can_fit(tuple_len) {
            return Err(StorageError::PageFull {
                needed: tuple_len + SLOT_SIZE,
                available: self.free_space(),
            });
        }

        let count = self.tuple_count();
        let index = match position {
            SlotPosition::Index(i) if i > count => {
                return Err(StorageError::SlotOutOfBounds { index: i, count })
            }
            SlotPosition::Index(i) => i,
            SlotPosition::GreatestKey => count,
        };

        let tuple_off = self.free_space_off();
        tuple.encode_into(&mut self.data[tuple_off..tuple_off + tuple_len])?;
        self.header.free_space_off = (tuple_off + tuple_len) as u32;

        if let Err(e) = OrderedSlotManager.insert_slot(self, position, tuple_off) {
            self.header.free_space_off = tuple_off as u32;
            return Err(e);
        }

        self.header.tuple_count += 1;
        self.header.flags &= !FLAG_SEALED;
        self.header.checksum = 0;
        self.sync_header();

        tracing::trace!(
            target: "btree_frame::frame",
            index,
            tuple_off,
            tuple_len,
            free_space = self.free_space(),
            "inserted tuple"
        );
        Ok(index)
    }

    /// Insert a tuple with a unique key at its sorted position
    pub fn insert_sorted(&mut self, tuple: &OwnedTuple, cmp: &MultiComparator) -> Result<usize> {
        let position = self.find_insert_position(tuple, cmp)?;
        self.insert(tuple, position)
    }

    /// Get the tuple at the given logical index
    pub fn tuple(&self, index: usize) -> Result<TupleRef<'_>> {
        let off = self.tuple_offset(index)?;
        TupleRef::parse(&self.data[off..self.free_space_off()])
    }

    /// Iterate over tuples in key order
    pub fn tuples(&self) -> impl Iterator<Item = Result<TupleRef<'_>>> + '_ {
        (0..self.tuple_count()).map(move |i| self.tuple(i))
    }

    /// Compute the CRC32 of the page with the checksum field zeroed
    pub fn compute_checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.data[..CHECKSUM_OFFSET]);
        hasher.update(&[0u8; 4]);
        hasher.update(&self.data[CHECKSUM_OFFSET + 4..]);
        hasher.finalize()
    }

    /// Stamp the current checksum into the header and mark the page sealed.
    ///
    /// The sealed flag is covered by the checksum, so clearing it on disk is
    /// caught as a mismatch.
    pub fn seal(&mut self) {
        self.header.flags |= FLAG_SEALED;
        self.sync_header();
        self.header.checksum = self.compute_checksum();
        self.sync_header();
    }

    /// Verify the stored checksum; unsealed pages pass
    pub fn verify_checksum(&self) -> Result<()> {
        if !self.header.is_sealed() {
            return Ok(());
        }
        let actual = self.compute_checksum();
        if actual != self.header.checksum {
            tracing::debug!(
                target: "btree_frame::frame",
                stored = self.header.checksum,
                actual,
                "checksum mismatch"
            );
            return Err(StorageError::corruption(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                self.header.checksum, actual
            )));
        }
        Ok(())
    }

    /// Snapshot of the frame for debugging output
    pub fn dump(&self) -> Result<FrameDump> {
        let mut slots = Vec::with_capacity(self.tuple_count());
        for index in 0..self.tuple_count() {
            let tuple = self.tuple(index)?;
            let fields = (0..tuple.field_count())
                .map(|f| tuple.field(f).map(preview_field))
                .collect::<Result<Vec<_>>>()?;
            slots.push(SlotDump {
                index,
                slot_off: self.slot_cell_offset(index)?,
                tuple_off: self.tuple_offset(index)?,
                fields,
            });
        }

        Ok(FrameDump {
            page_size: self.page_size(),
            level: self.header.level,
            tuple_count: self.tuple_count(),
            free_space_off: self.free_space_off(),
            free_space: self.free_space(),
            sealed: self.header.is_sealed(),
            slots,
        })
    }

    /// [`BTreeFrame::dump`] rendered as pretty-printed JSON
    pub fn dump_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.dump()?)?)
    }

    /// Sync the header to the raw page data
    fn sync_header(&mut self) {
        self.header.write(&mut self.data);
    }
}

impl SlotPage for BTreeFrame {
    fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn tuple_count(&self) -> usize {
        self.header.tuple_count as usize
    }

    fn tuple_region_start(&self) -> usize {
        HEADER_SIZE
    }

    fn tuple_region_end(&self) -> usize {
        self.header.free_space_off as usize
    }
}

impl Clone for BTreeFrame {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            header: self.header,
        }
    }
}

/// Serializable snapshot of a frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDump {
    /// Page size in bytes
    pub page_size: usize,
    /// Tree level
    pub level: u8,
    /// Number of tuples
    pub tuple_count: usize,
    /// End of the tuple region
    pub free_space_off: usize,
    /// Free bytes between the regions
    pub free_space: usize,
    /// Whether a checksum is stamped
    pub sealed: bool,
    /// Slots in key order
    pub slots: Vec<SlotDump>,
}

/// One slot in a [`FrameDump`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDump {
    /// Logical index
    pub index: usize,
    /// Byte offset of the slot cell
    pub slot_off: usize,
    /// Byte offset of the tuple
    pub tuple_off: usize,
    /// Field previews: text when printable UTF-8, hex otherwise
    pub fields: Vec<String>,
}

fn preview_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.is_empty() && !s.chars().any(char::is_control) => s.to_string(),
        _ => {
            let mut out = String::with_capacity(2 + bytes.len() * 2);
            out.push_str("0x");
            for b in bytes {
                out.push_str(&format!("{:02x}", b));
            }
            out
        }
    }
}
