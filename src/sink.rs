//! The byte sink capability: the tracer's only view of a transport.
//!
//! UART transmit registers, debug-probe memory channels, and anything else
//! that moves bytes off-device all look the same to the core: can a byte be
//! accepted right now, write one byte, and (for interrupt-driven drains)
//! raise an interrupt when ready for the next. Register-level drivers live
//! with the board support code, never here; the transport scheduler is the
//! only component that calls these methods.

/// A byte-oriented transport endpoint.
pub trait ByteSink {
    /// Whether the sink can accept a byte right now (e.g. TX register empty).
    fn ready(&self) -> bool;

    /// Write one byte. Only called when [`ready`](Self::ready) is true.
    fn write(&mut self, byte: u8);

    /// Ask the sink to raise its ready interrupt when it can take more.
    fn enable_ready_interrupt(&mut self);

    /// Stop raising the ready interrupt (drain finished).
    fn disable_ready_interrupt(&mut self);
}

/// A sink that discards everything, always ready.
///
/// Useful during bring-up, and the natural companion of the NoCode build.
pub struct NullSink;

impl ByteSink for NullSink {
    fn ready(&self) -> bool {
        true
    }

    fn write(&mut self, _byte: u8) {}

    fn enable_ready_interrupt(&mut self) {}

    fn disable_ready_interrupt(&mut self) {}
}
