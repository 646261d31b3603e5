//! The trace engine: buffering strategy x wire encoding.
//!
//! Two strategies implement the same per-event contract. [`DeferredTracer`]
//! stamps and reserves inside a short critical section, copies the frame into
//! the active half of a double buffer outside it, and leaves emission to the
//! transport scheduler. [`DirectTracer`] emits the whole frame to the sink
//! before returning, busy-polling readiness, and suits bring-up and hard
//! faults where deferred bytes would be lost.
//!
//! Both take the encoding as a type parameter, so exactly one strategy and
//! one wire format exist in a given build. The [`Tracer`] trait erases that
//! pair behind a `&'static dyn` for the global used by the trace macro.
//!
//! Trace calls never fail from the caller's view. A frame that cannot be
//! encoded, padded, or stored is dropped whole, the drop is counted in
//! [`TraceStats`], and the cycle counter still advances so the host sees the
//! gap.

use core::marker::PhantomData;

use conquer_once::spin::OnceCell;
use log::info;

use crate::buffer::DoubleBuffer;
use crate::cipher::{Xtea, BLOCK_SIZE};
use crate::codec::{encode_payload, CycleTail, Encoding};
use crate::cycle::CycleCounter;
use crate::event::{Arg, EventId};
use crate::frame::{FrameBuf, MAX_EVENT_SIZE};
use crate::lock::IrqLock;
use crate::sink::ByteSink;
use crate::stats::TraceStats;

/// Build-time engine configuration.
///
/// `const`-constructible so tracers can live in statics.
#[derive(Clone, Copy)]
pub struct Config {
    /// Append the wrapping cycle stamp to every frame.
    pub cycle_counter: bool,
    /// Encrypt each payload with this 128-bit key before framing.
    pub encrypt_key: Option<[u8; 16]>,
}

impl Config {
    /// Cycle counter on, encryption off.
    pub const fn new() -> Self {
        Self {
            cycle_counter: true,
            encrypt_key: None,
        }
    }

    pub const fn without_cycle_counter(mut self) -> Self {
        self.cycle_counter = false;
        self
    }

    pub const fn with_encryption(mut self, key: [u8; 16]) -> Self {
        self.encrypt_key = Some(key);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

const fn cipher_from(config: &Config) -> Option<Xtea> {
    match config.encrypt_key {
        Some(key) => Some(Xtea::from_bytes(key)),
        None => None,
    }
}

/// Strategy-erased trace entry point, installed once as the global engine.
pub trait Tracer: Sync {
    /// Record one event. Must be callable from any context, including
    /// interrupt handlers, and must never block on the transport.
    fn trace(&self, id: EventId, args: &[Arg]);

    /// Wire encoding name, for init logging.
    fn encoding_name(&self) -> &'static str;
}

static TRACER: OnceCell<&'static dyn Tracer> = OnceCell::uninit();

/// Install the global trace engine. The first call wins; later calls are
/// ignored and return `false`.
pub fn init(tracer: &'static dyn Tracer) -> bool {
    let installed = TRACER.try_init_once(|| tracer).is_ok();
    if installed {
        info!("trace engine online: encoding={}", tracer.encoding_name());
    }
    installed
}

/// Route one event to the installed engine. No-op before [`init`].
#[inline]
pub fn dispatch(id: u16, args: &[Arg]) {
    if let Ok(tracer) = TRACER.try_get() {
        tracer.trace(EventId::new(id), args);
    }
}

/// Double-buffered tracer: O(1) critical section, deferred emission.
///
/// The frame body (id, parameters, optional ciphertext, framing) is built on
/// the caller's stack before any lock is taken. The critical section covers
/// only the cycle stamp and the buffer reservation, so stamp order equals
/// buffer order and interrupt latency does not depend on frame size. The
/// 1-2 byte cycle tail is the only part of the frame whose value is decided
/// under the lock; it is appended after the body during the fill.
pub struct DeferredTracer<E: Encoding, const CAP: usize> {
    buffer: DoubleBuffer<CAP>,
    cycle: CycleCounter,
    cipher: Option<Xtea>,
    use_cycle: bool,
    stats: TraceStats,
    _encoding: PhantomData<fn() -> E>,
}

impl<E: Encoding, const CAP: usize> DeferredTracer<E, CAP> {
    pub const fn new(config: Config) -> Self {
        Self {
            buffer: DoubleBuffer::new(),
            cycle: CycleCounter::new(),
            cipher: cipher_from(&config),
            use_cycle: config.cycle_counter,
            stats: TraceStats::new(),
            _encoding: PhantomData,
        }
    }

    /// The buffer the transport scheduler drains.
    pub fn buffer(&self) -> &DoubleBuffer<CAP> {
        &self.buffer
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// A dropped event still consumes its cycle value so the host sees a
    /// numbered gap instead of a seamless sequence.
    fn drop_cycle(&self) {
        if self.use_cycle {
            self.cycle.next();
        }
    }
}

enum DropCause {
    Oversize,
    Cipher,
}

/// Encode, pad/encrypt, and frame one event body, cycle tail excluded.
/// Shared by both strategies; drops map to their counted cause.
fn build_body<E: Encoding>(
    cipher: Option<&Xtea>,
    use_cycle: bool,
    id: EventId,
    args: &[Arg],
    body: &mut FrameBuf,
) -> Result<(), DropCause> {
    let mut payload = FrameBuf::new();
    encode_payload::<E>(id, args, &mut payload).map_err(|_| DropCause::Oversize)?;
    if let Some(cipher) = cipher {
        payload
            .pad_to_block(BLOCK_SIZE)
            .map_err(|_| DropCause::Cipher)?;
        cipher.encrypt_in_place(payload.as_mut_slice());
    }
    if payload.len() + use_cycle as usize > MAX_EVENT_SIZE {
        return Err(DropCause::Oversize);
    }
    E::frame(payload.as_slice(), use_cycle, body).map_err(|_| DropCause::Oversize)
}

impl<E: Encoding, const CAP: usize> Tracer for DeferredTracer<E, CAP> {
    fn trace(&self, id: EventId, args: &[Arg]) {
        if !E::EMITS {
            return;
        }
        let mut body = FrameBuf::new();
        if let Err(cause) =
            build_body::<E>(self.cipher.as_ref(), self.use_cycle, id, args, &mut body)
        {
            match cause {
                DropCause::Oversize => self.stats.count_oversize(),
                DropCause::Cipher => self.stats.count_cipher(),
            }
            self.drop_cycle();
            return;
        }

        let stored = self.buffer.write_with(
            || {
                let tail = if self.use_cycle {
                    E::cycle_tail(self.cycle.next())
                } else {
                    CycleTail::empty()
                };
                (body.len() + tail.len(), tail)
            },
            |dst, tail| {
                dst[..body.len()].copy_from_slice(body.as_slice());
                dst[body.len()..].copy_from_slice(tail.as_slice());
            },
        );
        if stored {
            self.stats.count_event();
        } else {
            self.stats.count_overflow();
        }
    }

    fn encoding_name(&self) -> &'static str {
        E::NAME
    }
}

/// Transient tracer: encode on the stack, emit before returning.
///
/// The whole call runs inside the critical section so frames from nested
/// contexts never interleave on the wire; the busy-poll drain makes trace
/// latency proportional to frame size over sink throughput. That trade is
/// the point of direct mode.
pub struct DirectTracer<E: Encoding, S: ByteSink> {
    sink: IrqLock<S>,
    cycle: CycleCounter,
    cipher: Option<Xtea>,
    use_cycle: bool,
    stats: TraceStats,
    _encoding: PhantomData<fn() -> E>,
}

impl<E: Encoding, S: ByteSink> DirectTracer<E, S> {
    pub const fn new(sink: S, config: Config) -> Self {
        Self {
            sink: IrqLock::new(sink),
            cycle: CycleCounter::new(),
            cipher: cipher_from(&config),
            use_cycle: config.cycle_counter,
            stats: TraceStats::new(),
            _encoding: PhantomData,
        }
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// Run `f` against the sink, inside the critical section.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.sink.lock())
    }
}

impl<E: Encoding, S: ByteSink + Send> Tracer for DirectTracer<E, S> {
    fn trace(&self, id: EventId, args: &[Arg]) {
        if !E::EMITS {
            return;
        }
        let mut body = FrameBuf::new();
        if let Err(cause) =
            build_body::<E>(self.cipher.as_ref(), self.use_cycle, id, args, &mut body)
        {
            match cause {
                DropCause::Oversize => self.stats.count_oversize(),
                DropCause::Cipher => self.stats.count_cipher(),
            }
            if self.use_cycle {
                self.cycle.next();
            }
            return;
        }

        let mut sink = self.sink.lock();
        let tail = if self.use_cycle {
            E::cycle_tail(self.cycle.next())
        } else {
            CycleTail::empty()
        };
        for &byte in body.as_slice().iter().chain(tail.as_slice()) {
            while !sink.ready() {
                core::hint::spin_loop();
            }
            sink.write(byte);
        }
        self.stats.count_event();
    }

    fn encoding_name(&self) -> &'static str {
        E::NAME
    }
}
