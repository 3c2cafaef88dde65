//! Frame header structure.
//!
//! The frame header occupies the first bytes of each page and describes
//! where the tuple region ends and how many slots are live.

use crate::types::LEAF_LEVEL;

/// Size of the frame header
pub const HEADER_SIZE: usize = 16;

const TUPLE_COUNT_OFFSET: usize = 4;
const FREE_SPACE_OFFSET: usize = 8;
pub(crate) const CHECKSUM_OFFSET: usize = 12;

/// Flag bit set while the checksum field holds a stamped CRC32
pub const FLAG_SEALED: u8 = 0x01;

/// Frame header structure
///
/// Layout (16 bytes, big-endian):
/// ```text
/// Offset  Size  Description
/// 0       1     Level (0 for leaves)
/// 1       1     Flags (bit 0: sealed)
/// 2       2     Reserved
/// 4       4     Number of tuples (and slots) on this page
/// 8       4     Free space offset: end of the tuple region
/// 12      4     CRC32 of the page with this field zeroed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Tree level of this page
    pub level: u8,
    /// Flag bits, see [`FLAG_SEALED`]
    pub flags: u8,
    /// Number of tuples on this page
    pub tuple_count: u32,
    /// Offset one past the last tuple byte
    pub free_space_off: u32,
    /// Page checksum; meaningful only while [`FLAG_SEALED`] is set
    pub checksum: u32,
}

impl FrameHeader {
    /// Create a header for an empty leaf page
    pub fn new_leaf() -> Self {
        Self {
            level: LEAF_LEVEL,
            flags: 0,
            tuple_count: 0,
            free_space_off: HEADER_SIZE as u32,
            checksum: 0,
        }
    }

    /// Read a frame header from bytes
    pub fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }

        Some(Self {
            level: bytes[0],
            flags: bytes[1],
            tuple_count: read_u32(bytes, TUPLE_COUNT_OFFSET),
            free_space_off: read_u32(bytes, FREE_SPACE_OFFSET),
            checksum: read_u32(bytes, CHECKSUM_OFFSET),
        })
    }

    /// Write this header to bytes
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0] = self.level;
        bytes[1] = self.flags;
        bytes[2..4].fill(0);
        bytes[TUPLE_COUNT_OFFSET..TUPLE_COUNT_OFFSET + 4]
            .copy_from_slice(&self.tuple_count.to_be_bytes());
        bytes[FREE_SPACE_OFFSET..FREE_SPACE_OFFSET + 4]
            .copy_from_slice(&self.free_space_off.to_be_bytes());
        bytes[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&self.checksum.to_be_bytes());
    }

    /// Whether a checksum has been stamped since the last change
    pub fn is_sealed(&self) -> bool {
        self.flags & FLAG_SEALED != 0
    }

    /// Whether this header describes a leaf page
    pub fn is_leaf(&self) -> bool {
        self.level == LEAF_LEVEL
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = FrameHeader {
            level: 0,
            flags: 0,
            tuple_count: 5,
            free_space_off: 3500,
            checksum: 0xDEAD_BEEF,
        };

        let mut bytes = [0u8; HEADER_SIZE];
        header.write(&mut bytes);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 5]);

        let read_header = FrameHeader::read(&bytes).unwrap();
        assert_eq!(read_header, header);
        assert!(read_header.is_leaf());
    }

    #[test]
    fn test_new_leaf_starts_after_header() {
        let header = FrameHeader::new_leaf();
        assert_eq!(header.free_space_off as usize, HEADER_SIZE);
        assert_eq!(header.tuple_count, 0);
        assert!(FrameHeader::read(&[0u8; HEADER_SIZE - 1]).is_none());
        assert!(!header.is_sealed());
        assert!(FrameHeader { flags: FLAG_SEALED, ..header }.is_sealed());
    }
}
