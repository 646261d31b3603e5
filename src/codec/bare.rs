//! Bare encodings: fixed-width payloads with no or minimal framing.
//!
//! `BareSync` emits the payload alone; frame boundaries come from the
//! transport (a debug-probe memory channel delivers whole writes) or from
//! the host knowing each id's payload length. The cheapest possible wire
//! format: the concrete 3-byte scenario `id=100, one u8 = 42` encodes as
//! `[0x00, 0x64, 0x2A]`.
//!
//! `BareWrap` prefixes a two-byte sync marker and a one-byte payload length
//! so the same payload becomes self-describing; after corruption the host
//! rescans for the marker and locks back on.

use super::{
    parse_payload_be, payload_len_be, write_params_be, CodecError, Decoded, Encoding,
};
use crate::event::{Arg, ArgWidth};
use crate::frame::FrameBuf;

/// Sync marker opening every wrapped frame.
pub const SYNC_MARKER: [u8; 2] = [0x16, 0x16];

/// Fixed-width payload, no framing.
pub struct BareSync;

impl Encoding for BareSync {
    const NAME: &'static str = "bare-sync";

    fn write_params(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError> {
        write_params_be(args, payload)
    }

    fn frame(payload: &[u8], _cycle_follows: bool, out: &mut FrameBuf) -> Result<(), CodecError> {
        out.extend(payload)
    }
}

impl BareSync {
    /// Host contract: parse one frame from the start of `input`.
    ///
    /// The payload length is derived purely from the id's declared
    /// signature; no framing bytes exist to skip.
    pub fn decode(input: &[u8], sig: &[ArgWidth], cycle: bool) -> Result<Decoded, CodecError> {
        let (id, args, cycle_val) = parse_payload_be(input, sig, cycle)?;
        Ok(Decoded {
            id,
            args,
            cycle: cycle_val,
            consumed: payload_len_be(sig, cycle),
        })
    }
}

/// Fixed-width payload behind a sync marker and length byte.
pub struct BareWrap;

impl Encoding for BareWrap {
    const NAME: &'static str = "bare-wrap";

    fn write_params(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError> {
        write_params_be(args, payload)
    }

    fn frame(payload: &[u8], cycle_follows: bool, out: &mut FrameBuf) -> Result<(), CodecError> {
        // The length byte covers the cycle tail appended after framing.
        let wire_len = payload.len() + cycle_follows as usize;
        if wire_len > u8::MAX as usize {
            return Err(CodecError::Oversize);
        }
        out.extend(&SYNC_MARKER)?;
        out.push(wire_len as u8)?;
        out.extend(payload)
    }
}

impl BareWrap {
    /// Host contract: strip framing, returning the payload region (cycle
    /// byte included when present) and the bytes consumed, counting garbage
    /// skipped before the marker.
    ///
    /// Scans forward for the sync marker, so a corrupted stream resynchronizes
    /// on the next intact frame.
    pub fn unframe(input: &[u8]) -> Result<(&[u8], usize), CodecError> {
        let start = find_marker(input).ok_or(CodecError::Truncated)?;
        let rest = &input[start + SYNC_MARKER.len()..];
        let (&len, body) = rest.split_first().ok_or(CodecError::Truncated)?;
        let len = len as usize;
        if body.len() < len {
            return Err(CodecError::Truncated);
        }
        Ok((&body[..len], start + SYNC_MARKER.len() + 1 + len))
    }

    /// Host contract: parse one frame, resynchronizing on the marker.
    pub fn decode(input: &[u8], sig: &[ArgWidth], cycle: bool) -> Result<Decoded, CodecError> {
        let (payload, consumed) = Self::unframe(input)?;
        if payload.len() != payload_len_be(sig, cycle) {
            return Err(CodecError::BadFrame);
        }
        let (id, args, cycle_val) = parse_payload_be(payload, sig, cycle)?;
        Ok(Decoded {
            id,
            args,
            cycle: cycle_val,
            consumed,
        })
    }
}

fn find_marker(input: &[u8]) -> Option<usize> {
    input
        .windows(SYNC_MARKER.len())
        .position(|w| w == SYNC_MARKER)
}
