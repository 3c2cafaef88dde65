//! Page layer: leaf frames over fixed-size page buffers.
//!
//! A frame uses the following layout:
//! - A fixed header contains metadata
//! - Tuples grow from the header toward the end of the page
//! - Slot cells grow from the end of the page toward the header
//! - Free space is in the middle

mod frame;
mod header;
mod latch;

pub use frame::{BTreeFrame, FrameDump, SlotDump};
pub use header::{FrameHeader, FLAG_SEALED, HEADER_SIZE};
pub use latch::LatchedFrame;

/// A raw page buffer
#[derive(Clone)]
pub struct PageBuf {
    data: Box<[u8]>,
}

impl PageBuf {
    /// Create a new zeroed page buffer
    pub fn new(page_size: usize) -> Self {
        Self {
            data: vec![0u8; page_size].into_boxed_slice(),
        }
    }

    /// Create a page buffer holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec().into_boxed_slice(),
        }
    }

    /// Size of the page in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer has zero length
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::ops::Deref for PageBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::ops::DerefMut for PageBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl AsRef<[u8]> for PageBuf {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for PageBuf {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
