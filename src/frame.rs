//! Fixed-capacity frame buffer for a single encoded event.
//!
//! `FrameBuf` is the transient workspace every encoder writes into: a fixed
//! byte array with a write cursor. It is stack-allocated per trace call and
//! refuses writes past its capacity rather than ever overrunning the backing
//! storage.

use crate::codec::CodecError;

/// Capacity of the per-event frame workspace.
///
/// Sized for the worst case: 2 id bytes + 12 x 8 parameter bytes + cycle
/// byte, padded to the cipher block, then escape-stuffed (which can double
/// the payload) plus framing. Must be >= 2 * MAX_EVENT_SIZE + 3.
pub const MAX_FRAME_SIZE: usize = 256;

/// Configured maximum size of one encoded event payload, pre-framing.
///
/// Events whose payload (after padding) would exceed this are dropped at the
/// source, never truncated on the wire.
pub const MAX_EVENT_SIZE: usize = 104;

const _: () = assert!(MAX_FRAME_SIZE >= 2 * MAX_EVENT_SIZE + 3);

/// A fixed-capacity byte buffer with a write cursor.
#[derive(Clone, Copy)]
pub struct FrameBuf {
    bytes: [u8; MAX_FRAME_SIZE],
    len: usize,
}

impl FrameBuf {
    /// Create an empty frame buffer.
    #[inline]
    pub const fn new() -> Self {
        Self {
            bytes: [0; MAX_FRAME_SIZE],
            len: 0,
        }
    }

    /// Append one byte.
    #[inline]
    pub fn push(&mut self, b: u8) -> Result<(), CodecError> {
        if self.len == MAX_FRAME_SIZE {
            return Err(CodecError::Oversize);
        }
        self.bytes[self.len] = b;
        self.len += 1;
        Ok(())
    }

    /// Append a byte slice.
    pub fn extend(&mut self, src: &[u8]) -> Result<(), CodecError> {
        if self.len + src.len() > MAX_FRAME_SIZE {
            return Err(CodecError::Oversize);
        }
        self.bytes[self.len..self.len + src.len()].copy_from_slice(src);
        self.len += src.len();
        Ok(())
    }

    /// The written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Mutable view of the written bytes (in-place encryption).
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining capacity in bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        MAX_FRAME_SIZE - self.len
    }

    /// Reset the cursor; the storage is overwritten on the next use.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Zero-pad until `len` is a multiple of `block`, or fail if the padded
    /// length would exceed `MAX_EVENT_SIZE`.
    pub fn pad_to_block(&mut self, block: usize) -> Result<(), CodecError> {
        debug_assert!(block.is_power_of_two());
        let padded = (self.len + block - 1) & !(block - 1);
        if padded > MAX_EVENT_SIZE {
            return Err(CodecError::Oversize);
        }
        while self.len < padded {
            self.bytes[self.len] = 0;
            self.len += 1;
        }
        Ok(())
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        Self::new()
    }
}
