//! Pack encoding: minimal-width parameters for bandwidth-starved links.
//!
//! Each parameter becomes a one-byte length tag `n` (the smallest byte count
//! the value fits in, 0 through 8) followed by `n` big-endian value bytes.
//! Zero is the tag alone; a full 64-bit value costs nine bytes. The declared
//! width of a parameter is not transmitted at all: the host recovers it from
//! the id's signature and only needs the tag to know how many bytes follow.

use super::{CodecError, Decoded, Encoding};
use crate::event::{Arg, ArgList, ArgWidth, EventId};
use crate::frame::FrameBuf;

/// Minimal-width packed parameters, no framing.
pub struct Pack;

impl Encoding for Pack {
    const NAME: &'static str = "pack";

    fn write_params(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError> {
        for arg in args {
            let v = arg.as_u64();
            let n = packed_len(v);
            payload.push(n as u8)?;
            payload.extend(&v.to_be_bytes()[8 - n..])?;
        }
        Ok(())
    }

    fn frame(payload: &[u8], _cycle_follows: bool, out: &mut FrameBuf) -> Result<(), CodecError> {
        out.extend(payload)
    }
}

/// Minimal byte count a value fits in (0 for value 0, 8 for a full u64).
#[inline]
pub(crate) fn packed_len(v: u64) -> usize {
    8 - v.leading_zeros() as usize / 8
}

impl Pack {
    /// Host contract: parse one packed frame from the start of `input`.
    ///
    /// The signature supplies the declared width of each parameter; a tag
    /// wider than the declared width means the stream is out of step.
    pub fn decode(input: &[u8], sig: &[ArgWidth], cycle: bool) -> Result<Decoded, CodecError> {
        if input.len() < 2 {
            return Err(CodecError::Truncated);
        }
        let id = EventId::from_halves(input[0], input[1]);
        let mut at = 2;
        let mut args = ArgList::new();
        for &w in sig {
            let &tag = input.get(at).ok_or(CodecError::Truncated)?;
            at += 1;
            let n = tag as usize;
            if n > w.bytes() {
                return Err(CodecError::BadFrame);
            }
            let bytes = input.get(at..at + n).ok_or(CodecError::Truncated)?;
            at += n;
            let mut v = 0u64;
            for &b in bytes {
                v = (v << 8) | b as u64;
            }
            let arg = match w {
                ArgWidth::B8 => Arg::U8(v as u8),
                ArgWidth::B16 => Arg::U16(v as u16),
                ArgWidth::B32 => Arg::U32(v as u32),
                ArgWidth::B64 => Arg::U64(v),
            };
            let _ = args.push(arg);
        }
        let cycle_val = if cycle {
            let &c = input.get(at).ok_or(CodecError::Truncated)?;
            at += 1;
            Some(c)
        } else {
            None
        };
        Ok(Decoded {
            id,
            args,
            cycle: cycle_val,
            consumed: at,
        })
    }
}
