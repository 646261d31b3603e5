//! Binary event tracing for embedded targets.
//!
//! A trace call names a 16-bit event id and up to twelve unsigned values;
//! the format strings live in host-side tooling, so the target ships ids and
//! raw parameter bytes only. The engine is built from three orthogonal
//! choices, each fixed at build time:
//!
//! - a wire encoding ([`BareSync`], [`BareWrap`], [`Escape`], [`Pack`], or
//!   [`NoCode`] to compile tracing out),
//! - a buffering strategy ([`DeferredTracer`] with an active/spare double
//!   buffer, or [`DirectTracer`] emitting inside the call),
//! - a transport: any [`ByteSink`] driven by the [`Scheduler`], busy-polled
//!   or tick + ready-interrupt.
//!
//! ```text
//! trace!(id, args...)
//!       |
//!       v
//!   codec::Encoding ----> [XTEA payload encryption] ----> cycle tail
//!       |                                                    |
//!       v                                                    v
//!   DeferredTracer: double buffer --- swap ---> Scheduler ---> ByteSink
//!   DirectTracer:   stack frame ---- busy-poll drain --------> ByteSink
//! ```
//!
//! Calls never block on the transport and never report failure: an event
//! that cannot be stored is dropped whole, counted in [`TraceStats`], and
//! the wrapping cycle stamp leaves a gap the host detects. All multi-byte
//! values travel most significant byte first.
//!
//! The crate is freestanding (`no_std`); the embedder supplies a
//! [`ByteSink`] for its transport and, on single-core targets that trace
//! from interrupts, registers interrupt mask hooks via
//! [`lock::install_irq_hooks`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffer;
pub mod cipher;
pub mod codec;
pub mod cycle;
pub mod event;
pub mod frame;
pub mod lock;
mod macros;
pub mod sched;
pub mod sink;
pub mod stats;
pub mod tracer;

pub use buffer::DoubleBuffer;
pub use cipher::Xtea;
pub use codec::{BareSync, BareWrap, CodecError, Encoding, Escape, NoCode, Pack};
pub use event::{Arg, ArgWidth, EventId, MAX_ARGS};
pub use frame::{MAX_EVENT_SIZE, MAX_FRAME_SIZE};
pub use sched::Scheduler;
pub use sink::{ByteSink, NullSink};
pub use stats::TraceStats;
pub use tracer::{dispatch, init, Config, DeferredTracer, DirectTracer, Tracer};
