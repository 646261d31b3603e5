//! Wire encodings: event id + parameters to bytes, and the host's inverse.
//!
//! Every encoding shares the same payload skeleton in network byte order
//! (most significant byte first, so the host decoder is independent of the
//! target's endianness):
//!
//! ```text
//! +--------+--------+--------------------+-----------+
//! | id.hi  | id.lo  | params (variant)   | [cycle]   |
//! +--------+--------+--------------------+-----------+
//! ```
//!
//! What differs per variant is the parameter representation (fixed-width
//! big-endian vs. minimal-width packed) and the framing wrapped around the
//! finished payload (none, sync marker + length, or escape stuffing).
//!
//! The variant is a compile-time strategy: zero-sized types implementing
//! [`Encoding`], selected once per build by a generic parameter. The hot
//! path never branches on an encoding tag.
//!
//! Decoding belongs to the host, but the inverse contract lives here next to
//! each encoder so the round-trip laws are testable in one place. Decoders
//! take the id's declared parameter signature as input; matching an id to
//! its signature happens before any of this code runs.

mod bare;
mod escape;
mod pack;

pub use bare::{BareSync, BareWrap, SYNC_MARKER};
pub use escape::{Escape, ESC_BYTE, FRAME_DELIMITER};
pub use pack::Pack;

use crate::event::{Arg, ArgList, ArgWidth, EventId, MAX_ARGS};
use crate::frame::{FrameBuf, MAX_EVENT_SIZE};

/// Errors raised while constructing or parsing a frame.
///
/// On the target these never reach the caller of a trace call: a failed
/// construction drops the event silently (the cycle-counter gap is the only
/// observable trace). Parse-side variants exist for the host contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded event would exceed the configured maximum size.
    Oversize,
    /// More than [`MAX_ARGS`] parameters were supplied.
    TooManyParams,
    /// Input ended before a complete frame was read.
    Truncated,
    /// Framing bytes are inconsistent (bad marker, bad length tag).
    BadFrame,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::Oversize => f.write_str("encoded event exceeds maximum size"),
            CodecError::TooManyParams => f.write_str("too many parameters"),
            CodecError::Truncated => f.write_str("input truncated mid-frame"),
            CodecError::BadFrame => f.write_str("inconsistent framing bytes"),
        }
    }
}

/// A wire encoding strategy.
///
/// Implementors are zero-sized marker types; all operations are associated
/// functions so the compiler monomorphizes the single selected strategy into
/// the trace path.
pub trait Encoding {
    /// Diagnostic name, used in init logging only.
    const NAME: &'static str;

    /// Whether this strategy emits bytes at all. `false` compiles tracing
    /// out entirely (the NoCode build).
    const EMITS: bool = true;

    /// Append the parameter bytes of `args` to `payload`.
    fn write_params(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError>;

    /// Wrap a finished (possibly encrypted) payload into a wire frame.
    ///
    /// `cycle_follows` tells length-carrying framings to account for the
    /// cycle tail that will be appended after this call. The tail is written
    /// separately because its value is stamped under the buffer-reservation
    /// critical section, after the frame body is already built.
    fn frame(payload: &[u8], cycle_follows: bool, out: &mut FrameBuf) -> Result<(), CodecError>;

    /// Wire form of the cycle byte for this encoding.
    ///
    /// Plain single byte by default; the escape variant stuffs reserved
    /// values. At most 2 bytes, so reserving space for it under the critical
    /// section stays O(1).
    fn cycle_tail(c: u8) -> CycleTail {
        CycleTail::plain(c)
    }
}

/// The wire bytes of one cycle stamp (1 byte, or 2 when escape-stuffed).
#[derive(Clone, Copy, Debug)]
pub struct CycleTail {
    bytes: [u8; 2],
    len: usize,
}

impl CycleTail {
    /// An absent tail (cycle counter disabled).
    pub const fn empty() -> Self {
        Self {
            bytes: [0; 2],
            len: 0,
        }
    }

    /// A bare single-byte tail.
    pub const fn plain(c: u8) -> Self {
        Self {
            bytes: [c, 0],
            len: 1,
        }
    }

    /// A two-byte tail (escape-stuffed cycle value).
    pub const fn stuffed(prefix: u8, c: u8) -> Self {
        Self {
            bytes: [prefix, c],
            len: 2,
        }
    }

    /// The tail bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Tail length in wire bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tail carries no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Tracing compiled out: no payload, no frame, no bytes.
pub struct NoCode;

impl Encoding for NoCode {
    const NAME: &'static str = "nocode";
    const EMITS: bool = false;

    fn write_params(_args: &[Arg], _payload: &mut FrameBuf) -> Result<(), CodecError> {
        Ok(())
    }

    fn frame(_payload: &[u8], _cycle_follows: bool, _out: &mut FrameBuf) -> Result<(), CodecError> {
        Ok(())
    }

    fn cycle_tail(_c: u8) -> CycleTail {
        CycleTail::empty()
    }
}

/// Build the common payload: id halves then variant parameters.
///
/// Enforces the parameter-count and event-size limits; the caller is
/// responsible for matching `id` to a declared signature beforehand. The
/// cycle tail is appended after framing, not here.
pub fn encode_payload<E: Encoding>(
    id: EventId,
    args: &[Arg],
    payload: &mut FrameBuf,
) -> Result<(), CodecError> {
    if args.len() > MAX_ARGS {
        return Err(CodecError::TooManyParams);
    }
    payload.push(id.hi())?;
    payload.push(id.lo())?;
    E::write_params(args, payload)?;
    if payload.len() > MAX_EVENT_SIZE {
        return Err(CodecError::Oversize);
    }
    Ok(())
}

/// Encode one complete wire frame: payload, optional encryption, framing,
/// optional cycle tail.
///
/// This is the full per-event wire contract in one place; the tracer runs
/// the same stages split around its buffer reservation. Encryption pads the
/// payload to the cipher block and transforms it in place; the cycle tail is
/// never encrypted, so the stamp can be taken after the ciphertext exists.
pub fn encode_frame<E: Encoding>(
    id: EventId,
    args: &[Arg],
    cycle: Option<u8>,
    cipher: Option<&crate::cipher::Xtea>,
    out: &mut FrameBuf,
) -> Result<(), CodecError> {
    if !E::EMITS {
        return Ok(());
    }
    let mut payload = FrameBuf::new();
    encode_payload::<E>(id, args, &mut payload)?;
    if let Some(xtea) = cipher {
        payload.pad_to_block(crate::cipher::BLOCK_SIZE)?;
        xtea.encrypt_in_place(payload.as_mut_slice());
    }
    if payload.len() + cycle.is_some() as usize > MAX_EVENT_SIZE {
        return Err(CodecError::Oversize);
    }
    E::frame(payload.as_slice(), cycle.is_some(), out)?;
    if let Some(c) = cycle {
        out.extend(E::cycle_tail(c).as_slice())?;
    }
    Ok(())
}

/// Append fixed-width big-endian parameter bytes (bare/wrap/escape variants).
pub(crate) fn write_params_be(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError> {
    for arg in args {
        match *arg {
            Arg::U8(v) => payload.push(v)?,
            Arg::U16(v) => payload.extend(&v.to_be_bytes())?,
            Arg::U32(v) => payload.extend(&v.to_be_bytes())?,
            Arg::U64(v) => payload.extend(&v.to_be_bytes())?,
        }
    }
    Ok(())
}

/// Byte length of a fixed-width payload for a declared signature.
pub fn payload_len_be(sig: &[ArgWidth], cycle: bool) -> usize {
    2 + sig.iter().map(|w| w.bytes()).sum::<usize>() + cycle as usize
}

/// A decoded frame: the host contract's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub id: EventId,
    pub args: ArgList,
    pub cycle: Option<u8>,
    /// Bytes consumed from the input, including framing and any skipped
    /// garbage before resynchronization.
    pub consumed: usize,
}

/// Parse a fixed-width big-endian payload against a declared signature.
pub fn parse_payload_be(
    payload: &[u8],
    sig: &[ArgWidth],
    cycle: bool,
) -> Result<(EventId, ArgList, Option<u8>), CodecError> {
    let want = payload_len_be(sig, cycle);
    if payload.len() < want {
        return Err(CodecError::Truncated);
    }
    let id = EventId::from_halves(payload[0], payload[1]);
    let mut args = ArgList::new();
    let mut at = 2;
    for &w in sig {
        let arg = match w {
            ArgWidth::B8 => Arg::U8(payload[at]),
            ArgWidth::B16 => Arg::U16(u16::from_be_bytes([payload[at], payload[at + 1]])),
            ArgWidth::B32 => Arg::U32(u32::from_be_bytes([
                payload[at],
                payload[at + 1],
                payload[at + 2],
                payload[at + 3],
            ])),
            ArgWidth::B64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&payload[at..at + 8]);
                Arg::U64(u64::from_be_bytes(b))
            }
        };
        // Cannot overflow: sig.len() <= MAX_ARGS is the caller's contract,
        // and ArgList holds MAX_ARGS.
        let _ = args.push(arg);
        at += w.bytes();
    }
    let cycle_val = cycle.then(|| payload[at]);
    Ok((id, args, cycle_val))
}
