//! Drop and throughput counters.
//!
//! Trace calls never report failure to the caller, so the only on-target
//! evidence of trouble are these relaxed atomic counters. They are bumped on
//! the failure paths (and once per accepted event), read by the embedder for
//! post-mortem diagnosis, and never consulted on the hot path. The wire-level
//! loss signal remains the cycle-counter gap; these counters just say why.

use core::sync::atomic::{AtomicU32, Ordering};

/// Per-tracer event and drop counters.
pub struct TraceStats {
    /// Events accepted into a buffer.
    events: AtomicU32,
    /// Events whose encoded size exceeded the configured maximum.
    dropped_oversize: AtomicU32,
    /// Events that found no room in the active buffer.
    dropped_overflow: AtomicU32,
    /// Events whose payload could not be padded within the size limit.
    dropped_cipher: AtomicU32,
}

impl TraceStats {
    /// All-zero counters.
    pub const fn new() -> Self {
        Self {
            events: AtomicU32::new(0),
            dropped_oversize: AtomicU32::new(0),
            dropped_overflow: AtomicU32::new(0),
            dropped_cipher: AtomicU32::new(0),
        }
    }

    #[inline(always)]
    pub(crate) fn count_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn count_oversize(&self) {
        self.dropped_oversize.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn count_overflow(&self) {
        self.dropped_overflow.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn count_cipher(&self) {
        self.dropped_cipher.fetch_add(1, Ordering::Relaxed);
    }

    /// Events accepted into a buffer.
    pub fn events(&self) -> u32 {
        self.events.load(Ordering::Relaxed)
    }

    /// Events dropped because the encoded frame was too large.
    pub fn dropped_oversize(&self) -> u32 {
        self.dropped_oversize.load(Ordering::Relaxed)
    }

    /// Events dropped because the active buffer was full.
    pub fn dropped_overflow(&self) -> u32 {
        self.dropped_overflow.load(Ordering::Relaxed)
    }

    /// Events dropped by cipher padding validation.
    pub fn dropped_cipher(&self) -> u32 {
        self.dropped_cipher.load(Ordering::Relaxed)
    }

    /// Total dropped events, all causes.
    pub fn dropped_total(&self) -> u32 {
        self.dropped_oversize() + self.dropped_overflow() + self.dropped_cipher()
    }
}

impl Default for TraceStats {
    fn default() -> Self {
        Self::new()
    }
}
