//! Trace event model: event ids and typed scalar parameters.
//!
//! A trace event is nothing more than a numeric id (the host resolves it to a
//! format string offline) plus up to [`MAX_ARGS`] fixed-width unsigned
//! parameters. Events exist only for the duration of one encode call and are
//! never persisted; the encoded frame is the durable artifact.

/// Maximum number of parameters a single trace event may carry.
pub const MAX_ARGS: usize = 12;

/// A trace event identifier.
///
/// The 16-bit id is carried on the wire as two half-words so frame headers
/// stay small while the id space stays large: the high byte identifies the
/// feature/location group, the low byte is the sequence number within it.
/// The split is purely a header-layout concern; callers treat the id as one
/// opaque 16-bit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(u16);

impl EventId {
    /// Create an event id from its raw 16-bit value.
    #[inline(always)]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw 16-bit id value.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The feature/location half (most significant byte on the wire).
    #[inline(always)]
    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// The sequence half (least significant byte on the wire).
    #[inline(always)]
    pub const fn lo(self) -> u8 {
        self.0 as u8
    }

    /// Reassemble an id from its two wire halves.
    #[inline(always)]
    pub const fn from_halves(hi: u8, lo: u8) -> Self {
        Self(((hi as u16) << 8) | lo as u16)
    }
}

impl From<u16> for EventId {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// One trace parameter: a fixed-width unsigned scalar.
///
/// All values are encoded as raw unsigned bit patterns in network byte order;
/// sign interpretation (and any formatting) is a host-side concern. Signed
/// values pass through `as` casts at the call site losslessly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arg {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Arg {
    /// Byte width of this parameter on the wire (bare encodings).
    #[inline(always)]
    pub const fn width(self) -> ArgWidth {
        match self {
            Arg::U8(_) => ArgWidth::B8,
            Arg::U16(_) => ArgWidth::B16,
            Arg::U32(_) => ArgWidth::B32,
            Arg::U64(_) => ArgWidth::B64,
        }
    }

    /// The value widened to 64 bits (raw bit pattern, zero extended).
    #[inline(always)]
    pub const fn as_u64(self) -> u64 {
        match self {
            Arg::U8(v) => v as u64,
            Arg::U16(v) => v as u64,
            Arg::U32(v) => v as u64,
            Arg::U64(v) => v,
        }
    }
}

impl From<u8> for Arg {
    #[inline(always)]
    fn from(v: u8) -> Self {
        Arg::U8(v)
    }
}

impl From<u16> for Arg {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Arg::U16(v)
    }
}

impl From<u32> for Arg {
    #[inline(always)]
    fn from(v: u32) -> Self {
        Arg::U32(v)
    }
}

impl From<u64> for Arg {
    #[inline(always)]
    fn from(v: u64) -> Self {
        Arg::U64(v)
    }
}

/// Declared byte width of a parameter in an event's signature.
///
/// The host knows each id's signature from the id list generated at build
/// time; the decoders take it as input to reconstruct parameter boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgWidth {
    B8,
    B16,
    B32,
    B64,
}

impl ArgWidth {
    /// Width in bytes.
    #[inline(always)]
    pub const fn bytes(self) -> usize {
        match self {
            ArgWidth::B8 => 1,
            ArgWidth::B16 => 2,
            ArgWidth::B32 => 4,
            ArgWidth::B64 => 8,
        }
    }
}

/// Fixed-capacity parameter list used on the decode side.
///
/// Decoding runs on the host (or in tests), but the contract lives next to
/// the encoders, so no heap is assumed here either.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgList {
    args: [Arg; MAX_ARGS],
    len: usize,
}

impl ArgList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            args: [Arg::U8(0); MAX_ARGS],
            len: 0,
        }
    }

    /// Append a parameter. Returns `false` when the list is full.
    #[must_use]
    pub fn push(&mut self, arg: Arg) -> bool {
        if self.len == MAX_ARGS {
            return false;
        }
        self.args[self.len] = arg;
        self.len += 1;
        true
    }

    /// The parameters as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Arg] {
        &self.args[..self.len]
    }

    /// Number of parameters held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ArgList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_halves_round_trip() {
        let id = EventId::new(0xABCD);
        assert_eq!(id.hi(), 0xAB);
        assert_eq!(id.lo(), 0xCD);
        assert_eq!(EventId::from_halves(id.hi(), id.lo()), id);
    }

    #[test]
    fn id_100_splits_per_header_rule() {
        // The concrete wire scenario: id 100 occupies the sequence half only.
        let id = EventId::new(100);
        assert_eq!(id.hi(), 0x00);
        assert_eq!(id.lo(), 0x64);
    }

    #[test]
    fn arg_widths() {
        assert_eq!(Arg::U8(1).width().bytes(), 1);
        assert_eq!(Arg::U16(1).width().bytes(), 2);
        assert_eq!(Arg::U32(1).width().bytes(), 4);
        assert_eq!(Arg::U64(1).width().bytes(), 8);
    }

    #[test]
    fn arg_from_conversions() {
        assert_eq!(Arg::from(7u8), Arg::U8(7));
        assert_eq!(Arg::from(7u16), Arg::U16(7));
        assert_eq!(Arg::from(7u32), Arg::U32(7));
        assert_eq!(Arg::from(7u64), Arg::U64(7));
    }

    #[test]
    fn arg_list_caps_at_max() {
        let mut list = ArgList::new();
        for i in 0..MAX_ARGS {
            assert!(list.push(Arg::U8(i as u8)));
        }
        assert!(!list.push(Arg::U8(0xFF)));
        assert_eq!(list.len(), MAX_ARGS);
        assert_eq!(list.as_slice()[3], Arg::U8(3));
    }
}
