//! Escape encoding: byte-stuffed frames for unreliable byte streams.
//!
//! A plain serial line gives no frame boundaries and no delivery guarantee,
//! so the frame start must be recoverable from the byte stream itself. Every
//! frame opens with the delimiter `0xEC`; inside the payload, each occurrence
//! of the delimiter or of the escape byte `0xDE` is prefixed with `0xDE`.
//! A receiver that joins mid-stream (or loses bytes to line noise) scans for
//! the next unescaped `0xEC` and is back in sync, one byte at a time, with
//! no length field needed.
//!
//! Stuffing runs last in the pipeline, after any encryption, so ciphertext
//! bytes that collide with the delimiter are escaped too.

use super::{parse_payload_be, payload_len_be, CodecError, CycleTail, Decoded, Encoding};
use crate::event::{Arg, ArgWidth};
use crate::frame::FrameBuf;

/// Frame start delimiter. Never appears unescaped inside a payload.
pub const FRAME_DELIMITER: u8 = 0xEC;

/// Escape prefix for payload bytes colliding with the reserved values.
pub const ESC_BYTE: u8 = 0xDE;

/// Byte-stuffed framing over fixed-width payloads.
pub struct Escape;

impl Encoding for Escape {
    const NAME: &'static str = "escape";

    fn write_params(args: &[Arg], payload: &mut FrameBuf) -> Result<(), CodecError> {
        super::write_params_be(args, payload)
    }

    fn frame(payload: &[u8], _cycle_follows: bool, out: &mut FrameBuf) -> Result<(), CodecError> {
        out.push(FRAME_DELIMITER)?;
        for &b in payload {
            if b == FRAME_DELIMITER || b == ESC_BYTE {
                out.push(ESC_BYTE)?;
            }
            out.push(b)?;
        }
        Ok(())
    }

    fn cycle_tail(c: u8) -> CycleTail {
        if c == FRAME_DELIMITER || c == ESC_BYTE {
            CycleTail::stuffed(ESC_BYTE, c)
        } else {
            CycleTail::plain(c)
        }
    }
}

impl Escape {
    /// Host contract: locate the next frame start and unescape exactly
    /// `payload_len` payload bytes into `out`.
    ///
    /// Returns the total bytes consumed from `input`, including skipped
    /// garbage before the delimiter. An unescaped delimiter inside the
    /// expected payload means the previous frame was cut short: that is a
    /// framing error, and the caller resumes scanning from the fresh
    /// delimiter.
    pub fn unframe(
        input: &[u8],
        payload_len: usize,
        out: &mut FrameBuf,
    ) -> Result<usize, CodecError> {
        let start = find_delimiter(input).ok_or(CodecError::Truncated)?;
        let mut at = start + 1;
        while out.len() < payload_len {
            let &b = input.get(at).ok_or(CodecError::Truncated)?;
            at += 1;
            if b == ESC_BYTE {
                let &stuffed = input.get(at).ok_or(CodecError::Truncated)?;
                at += 1;
                if stuffed != FRAME_DELIMITER && stuffed != ESC_BYTE {
                    return Err(CodecError::BadFrame);
                }
                out.push(stuffed)?;
            } else if b == FRAME_DELIMITER {
                return Err(CodecError::BadFrame);
            } else {
                out.push(b)?;
            }
        }
        Ok(at)
    }

    /// Host contract: parse one frame against a declared signature.
    pub fn decode(input: &[u8], sig: &[ArgWidth], cycle: bool) -> Result<Decoded, CodecError> {
        let mut payload = FrameBuf::new();
        let consumed = Self::unframe(input, payload_len_be(sig, cycle), &mut payload)?;
        let (id, args, cycle_val) = parse_payload_be(payload.as_slice(), sig, cycle)?;
        Ok(Decoded {
            id,
            args,
            cycle: cycle_val,
            consumed,
        })
    }
}

/// Position of the next frame-start delimiter, honoring escape prefixes.
fn find_delimiter(input: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            ESC_BYTE => i += 2, // skip the stuffed byte, whatever it is
            FRAME_DELIMITER => return Some(i),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_frame;
    use crate::event::EventId;

    fn encode(id: u16, args: &[Arg], cycle: Option<u8>) -> FrameBuf {
        let mut out = FrameBuf::new();
        encode_frame::<Escape>(EventId::new(id), args, cycle, None, &mut out).unwrap();
        out
    }

    #[test]
    fn delimiter_opens_every_frame() {
        let f = encode(100, &[Arg::U8(42)], None);
        assert_eq!(f.as_slice(), &[0xEC, 0x00, 0x64, 0x2A]);
    }

    #[test]
    fn reserved_bytes_are_stuffed() {
        // Payload bytes 0xEC and 0xDE each gain an 0xDE prefix.
        let f = encode(0xECDE, &[Arg::U8(0xEC), Arg::U8(0xDE)], None);
        assert_eq!(
            f.as_slice(),
            &[0xEC, 0xDE, 0xEC, 0xDE, 0xDE, 0xDE, 0xEC, 0xDE, 0xDE]
        );
    }

    #[test]
    fn stuffed_payload_round_trips_bit_for_bit() {
        // Reserved values at every position of a multi-width payload.
        let args = [
            Arg::U8(0xEC),
            Arg::U16(0xDEEC),
            Arg::U32(0xECEC_DEDE),
            Arg::U64(0xDEDE_DEDE_ECEC_ECEC),
        ];
        let sig = [ArgWidth::B8, ArgWidth::B16, ArgWidth::B32, ArgWidth::B64];
        let f = encode(0xDEEC, &args, Some(0xEC));
        let d = Escape::decode(f.as_slice(), &sig, true).unwrap();
        assert_eq!(d.id, EventId::new(0xDEEC));
        assert_eq!(d.args.as_slice(), &args);
        assert_eq!(d.cycle, Some(0xEC));
        assert_eq!(d.consumed, f.len());
    }

    #[test]
    fn cycle_tail_stuffs_reserved_values_only() {
        assert_eq!(Escape::cycle_tail(0x42).as_slice(), &[0x42]);
        assert_eq!(Escape::cycle_tail(0xEC).as_slice(), &[0xDE, 0xEC]);
        assert_eq!(Escape::cycle_tail(0xDE).as_slice(), &[0xDE, 0xDE]);
    }

    #[test]
    fn resyncs_on_delimiter_after_garbage() {
        let f = encode(7, &[Arg::U8(1)], None);
        let mut noisy = [0u8; 16];
        // Garbage including an escaped delimiter, which must not resync.
        noisy[..3].copy_from_slice(&[0x55, 0xDE, 0xEC]);
        noisy[3..3 + f.len()].copy_from_slice(f.as_slice());
        let d = Escape::decode(&noisy[..3 + f.len()], &[ArgWidth::B8], false).unwrap();
        assert_eq!(d.id, EventId::new(7));
        assert_eq!(d.consumed, 3 + f.len());
    }

    #[test]
    fn early_delimiter_is_bad_frame() {
        // A fresh frame start inside the expected payload: previous frame was
        // cut short on the line.
        let input = [0xEC, 0x00, 0xEC, 0x00, 0x07, 0x2A];
        assert_eq!(
            Escape::decode(&input, &[ArgWidth::B8], false),
            Err(CodecError::BadFrame)
        );
    }

    #[test]
    fn truncated_input_detected() {
        let f = encode(7, &[Arg::U32(0xECEC_ECEC)], None);
        let cut = &f.as_slice()[..f.len() - 1];
        assert_eq!(
            Escape::decode(cut, &[ArgWidth::B32], false),
            Err(CodecError::Truncated)
        );
    }
}
