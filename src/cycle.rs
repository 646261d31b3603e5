//! Cycle counter: the loss-detection stamp.
//!
//! A process-wide wrapping 8-bit counter, bumped once per trace call and
//! appended to frames when the build enables loss detection. The engine never
//! blocks and never retries, so a gap in the received counter sequence is the
//! host's only evidence that events were dropped (oversize, buffer overflow,
//! or cipher padding failure). The counter says nothing about time or
//! ordering beyond sequence.
//!
//! `next()` is called inside the same exclusivity window as the buffer
//! reservation so stamped order always equals buffer order.

use core::sync::atomic::{AtomicU8, Ordering};

/// Wrapping per-event counter.
pub struct CycleCounter {
    value: AtomicU8,
}

impl CycleCounter {
    /// Create a counter starting at zero.
    pub const fn new() -> Self {
        Self {
            value: AtomicU8::new(0),
        }
    }

    /// Return the current value and advance, wrapping at 255.
    ///
    /// Relaxed ordering is enough: the surrounding critical section is what
    /// orders the stamp against the buffer write.
    #[inline(always)]
    pub fn next(&self) -> u8 {
        self.value.fetch_add(1, Ordering::Relaxed)
    }

    /// Peek at the value the next trace call will be stamped with.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for CycleCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_consecutively() {
        let c = CycleCounter::new();
        for expect in 0u8..=20 {
            assert_eq!(c.next(), expect);
        }
        assert_eq!(c.peek(), 21);
    }

    #[test]
    fn wraps_at_byte_boundary() {
        let c = CycleCounter::new();
        for _ in 0..255 {
            c.next();
        }
        assert_eq!(c.next(), 255);
        assert_eq!(c.next(), 0);
    }
}
