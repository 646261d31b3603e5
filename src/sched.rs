//! Transport scheduler: moves swapped-out frames to the byte sink.
//!
//! Two driving styles share one implementation. Busy-poll calls
//! [`Scheduler::tick`] in a loop; a periodic timer calls `tick` once per
//! period and lets the sink's ready interrupt call
//! [`Scheduler::on_sink_ready`] for the bytes in between. Either way a tick
//! that finds the transmitter idle swaps the double buffer and starts a new
//! drain; a tick that finds a drain in progress just pushes more bytes.
//!
//! The scheduler owns the only mutable view of a drain, so it takes `&mut
//! self`; callers serialize tick and ready-interrupt contexts themselves
//! (mask the sink interrupt around `tick`, or run both from the same
//! priority level).

use crate::buffer::DoubleBuffer;
use crate::sink::ByteSink;

/// An in-flight drain of the spare region.
struct Tx {
    region: usize,
    len: usize,
    sent: usize,
}

/// Drives one [`DoubleBuffer`] into one [`ByteSink`].
pub struct Scheduler<'a, const CAP: usize, S: ByteSink> {
    buffer: &'a DoubleBuffer<CAP>,
    sink: S,
    tx: Option<Tx>,
}

impl<'a, const CAP: usize, S: ByteSink> Scheduler<'a, CAP, S> {
    pub const fn new(buffer: &'a DoubleBuffer<CAP>, sink: S) -> Self {
        Self {
            buffer,
            sink,
            tx: None,
        }
    }

    /// Periodic entry point. Starts a drain when idle, then sends as many
    /// bytes as the sink will take right now.
    pub fn tick(&mut self) {
        if self.tx.is_none() {
            if let Some((region, len)) = self.buffer.swap() {
                self.tx = Some(Tx {
                    region,
                    len,
                    sent: 0,
                });
                self.sink.enable_ready_interrupt();
            }
        }
        self.pump();
    }

    /// Sink-ready interrupt entry point.
    pub fn on_sink_ready(&mut self) {
        self.pump();
    }

    /// True while spare-region bytes remain unsent.
    pub fn is_draining(&self) -> bool {
        self.tx.is_some()
    }

    /// Access the sink, e.g. to flush a hardware FIFO at shutdown.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn pump(&mut self) {
        let tx = match &mut self.tx {
            Some(tx) => tx,
            None => return,
        };
        while tx.sent < tx.len && self.sink.ready() {
            // SAFETY: region/len came from swap() and drained() has not run;
            // sent < len bounds the index.
            let byte = unsafe { self.buffer.byte_at(tx.region, tx.sent) };
            self.sink.write(byte);
            tx.sent += 1;
        }
        if tx.sent == tx.len {
            self.tx = None;
            self.sink.disable_ready_interrupt();
            self.buffer.drained();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::RecordingSink;

    fn fill<const CAP: usize>(buf: &DoubleBuffer<CAP>, bytes: &[u8]) {
        assert!(buf.write_with(
            || (bytes.len(), ()),
            |dst, ()| dst.copy_from_slice(bytes)
        ));
    }

    #[test]
    fn tick_drains_committed_bytes() {
        let buf: DoubleBuffer<64> = DoubleBuffer::new();
        fill(&buf, &[0x00, 0x64, 0x2A]);
        let mut sched = Scheduler::new(&buf, RecordingSink::new());
        sched.tick();
        assert!(!sched.is_draining());
        assert_eq!(sched.sink_mut().bytes, vec![0x00, 0x64, 0x2A]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn idle_tick_is_a_no_op() {
        let buf: DoubleBuffer<64> = DoubleBuffer::new();
        let mut sched = Scheduler::new(&buf, RecordingSink::new());
        sched.tick();
        assert!(!sched.is_draining());
        assert!(sched.sink_mut().bytes.is_empty());
    }

    #[test]
    fn throttled_sink_finishes_via_ready_interrupts() {
        let buf: DoubleBuffer<64> = DoubleBuffer::new();
        fill(&buf, &[1, 2, 3, 4]);
        let mut sched = Scheduler::new(&buf, RecordingSink::throttled());
        sched.tick();
        assert!(sched.is_draining());
        assert!(sched.sink_mut().irq_enabled);
        while sched.is_draining() {
            sched.on_sink_ready();
        }
        assert_eq!(sched.sink_mut().bytes, vec![1, 2, 3, 4]);
        // Interrupt disabled once the drain completes.
        assert!(!sched.sink_mut().irq_enabled);
    }

    #[test]
    fn writes_during_drain_go_out_on_the_next_swap() {
        let buf: DoubleBuffer<64> = DoubleBuffer::new();
        fill(&buf, &[1, 2]);
        let mut sched = Scheduler::new(&buf, RecordingSink::throttled());
        sched.tick();
        assert!(sched.is_draining());
        // New events land in the active region while the spare drains.
        fill(&buf, &[3, 4]);
        while sched.is_draining() {
            sched.on_sink_ready();
        }
        assert_eq!(sched.sink_mut().bytes, vec![1, 2]);
        sched.tick();
        while sched.is_draining() {
            sched.on_sink_ready();
        }
        assert_eq!(sched.sink_mut().bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn busy_poll_loop_drains_everything() {
        let buf: DoubleBuffer<32> = DoubleBuffer::new();
        let mut sched = Scheduler::new(&buf, RecordingSink::throttled());
        for round in 0u8..4 {
            fill(&buf, &[round; 3]);
            for _ in 0..16 {
                sched.tick();
            }
        }
        assert_eq!(sched.sink_mut().bytes.len(), 12);
    }
}
