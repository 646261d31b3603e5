//! Active/spare double buffering: non-blocking capture, deferred drain.
//!
//! Two fixed-capacity byte regions swap roles: "active" receives event
//! frames from any execution context, "spare" is streamed to the sink by the
//! transport scheduler. Which region is active is the single piece of shared
//! mutable state in the deferred pipeline, and it changes only inside the
//! critical section, only at the scheduler's request.
//!
//! # Write discipline
//!
//! A writer enters the critical section just long enough to stamp its cycle
//! value and advance the reservation cursor — O(1), no byte copying — then
//! copies its frame into the reserved region outside the lock and bumps the
//! commit cursor. One event's bytes are therefore always contiguous, and
//! interrupt latency never depends on frame size.
//!
//! A swap flips the roles, records the committed length as the spare's send
//! length, and resets the new active cursor: two words and a cursor, nothing
//! else. If a writer's copy is still in flight (reserved != committed) the
//! swap is skipped and retried at the next tick, so a half-copied frame can
//! never leak onto the wire.
//!
//! # Overflow
//!
//! A frame that does not fit in the remaining active capacity is dropped
//! whole — never truncated, which would desynchronize length-implicit
//! encodings for every frame after it. The cycle-counter gap is the host's
//! loss signal; [`TraceStats`](crate::stats::TraceStats) records the reason.

use core::cell::UnsafeCell;

use crate::lock::IrqLock;

/// Cursor state shared between writers and the scheduler.
struct Cursors {
    /// Index (0/1) of the region currently receiving writes.
    active: usize,
    /// Bytes reserved in the active region.
    reserved: usize,
    /// Bytes whose copy has completed in the active region.
    committed: usize,
    /// Unsent bytes in the spare region, set at swap, cleared after drain.
    pending: usize,
}

/// One fixed-capacity buffer region.
///
/// Interior mutability is required because writers fill disjoint reserved
/// spans through a shared reference; the reservation protocol guarantees
/// exclusivity per span.
struct Region<const CAP: usize> {
    bytes: UnsafeCell<[u8; CAP]>,
}

/// Double buffer with `CAP` bytes per region.
pub struct DoubleBuffer<const CAP: usize> {
    cursors: IrqLock<Cursors>,
    regions: [Region<CAP>; 2],
}

// SAFETY: all cursor state is behind the IrqLock; region bytes are only
// touched through reservations (disjoint spans, active region) or by the
// single drainer (spare region, only between swap and drained), which the
// cursor protocol keeps from overlapping.
unsafe impl<const CAP: usize> Sync for DoubleBuffer<CAP> {}

impl<const CAP: usize> DoubleBuffer<CAP> {
    /// Create an empty double buffer.
    pub const fn new() -> Self {
        Self {
            cursors: IrqLock::new(Cursors {
                active: 0,
                reserved: 0,
                committed: 0,
                pending: 0,
            }),
            regions: [
                Region {
                    bytes: UnsafeCell::new([0; CAP]),
                },
                Region {
                    bytes: UnsafeCell::new([0; CAP]),
                },
            ],
        }
    }

    /// Capacity of each region in bytes.
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Write one event's bytes without blocking.
    ///
    /// `prepare` runs inside the critical section and returns the exact byte
    /// length to reserve plus a context value handed to `fill`; stamping the
    /// cycle counter belongs in `prepare` so stamp order equals buffer
    /// order. `fill` runs after the critical section and must write exactly
    /// the reserved length.
    ///
    /// Returns `false` when the active region has no room; the event is then
    /// dropped whole.
    pub fn write_with<T>(
        &self,
        prepare: impl FnOnce() -> (usize, T),
        fill: impl FnOnce(&mut [u8], T),
    ) -> bool {
        let (region, offset, len, ctx) = {
            let mut c = self.cursors.lock();
            let (len, ctx) = prepare();
            if len == 0 {
                return true;
            }
            if c.reserved + len > CAP {
                return false;
            }
            let offset = c.reserved;
            c.reserved += len;
            (c.active, offset, len, ctx)
        };

        // SAFETY: [offset, offset+len) in the active region was reserved
        // above and belongs exclusively to this writer until committed; the
        // scheduler never reads the active region, and a swap cannot occur
        // while reserved != committed. The span is built from a raw pointer
        // so no reference to the whole region ever exists: a preempting
        // writer filling its own reservation holds a reference only to its
        // disjoint span, which keeps concurrent fills alias-free.
        let span = unsafe {
            let base = self.regions[region].bytes.get().cast::<u8>();
            core::slice::from_raw_parts_mut(base.add(offset), len)
        };
        fill(span, ctx);

        self.cursors.lock().committed += len;
        true
    }

    /// Flip active and spare. Scheduler only.
    ///
    /// Returns the spare region index and its send length, or `None` when
    /// there is nothing to send, the previous drain has not been collected,
    /// or a writer's copy is still in flight.
    pub(crate) fn swap(&self) -> Option<(usize, usize)> {
        let mut c = self.cursors.lock();
        if c.pending != 0 || c.committed == 0 || c.reserved != c.committed {
            return None;
        }
        let send = c.committed;
        let spare = c.active;
        c.active ^= 1;
        c.reserved = 0;
        c.committed = 0;
        c.pending = send;
        Some((spare, send))
    }

    /// Read one byte of the spare region during a drain.
    ///
    /// # Safety
    ///
    /// `region`/`at` must come from the pair returned by [`swap`](Self::swap)
    /// with `at < len`, and [`drained`](Self::drained) must not have been
    /// called since. The spare region is not written while `pending != 0`.
    pub(crate) unsafe fn byte_at(&self, region: usize, at: usize) -> u8 {
        // SAFETY: caller upholds the drain protocol above. Read through a
        // raw pointer so the drainer never holds a reference overlapping a
        // writer's span in the other region.
        unsafe { *self.regions[region].bytes.get().cast::<u8>().add(at) }
    }

    /// Mark the spare region fully sent, making it eligible to become
    /// active again at the next swap.
    pub(crate) fn drained(&self) {
        self.cursors.lock().pending = 0;
    }

    /// Committed bytes waiting in the active region.
    pub fn active_len(&self) -> usize {
        self.cursors.lock().committed
    }

    /// Unsent bytes in the spare region.
    pub fn pending_len(&self) -> usize {
        self.cursors.lock().pending
    }
}

impl<const CAP: usize> Default for DoubleBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
