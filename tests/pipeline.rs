//! Whole-pipeline tests: trace call to decoded host event.
//!
//! Each test drives the public API only, the way an embedder would: build a
//! tracer, record events, run the scheduler against a sink, then decode the
//! captured wire bytes with the host-side contract and compare.

use tracewire::codec::{BareSync, BareWrap, Escape, Pack};
use tracewire::tracer::Tracer;
use tracewire::{
    Arg, ArgWidth, ByteSink, Config, DeferredTracer, DirectTracer, EventId, Scheduler, Xtea,
};

/// Captures everything; optionally accepts only every other poll so drains
/// span multiple scheduler entries.
#[derive(Default)]
struct CaptureSink {
    bytes: Vec<u8>,
    throttle: bool,
    irq_enabled: bool,
    polls: std::cell::Cell<u32>,
}

impl CaptureSink {
    fn throttled() -> Self {
        Self {
            throttle: true,
            ..Self::default()
        }
    }
}

impl ByteSink for CaptureSink {
    fn ready(&self) -> bool {
        if !self.throttle {
            return true;
        }
        let n = self.polls.get();
        self.polls.set(n + 1);
        n % 2 == 1
    }

    fn write(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    fn enable_ready_interrupt(&mut self) {
        self.irq_enabled = true;
    }

    fn disable_ready_interrupt(&mut self) {
        self.irq_enabled = false;
    }
}

fn drain_all<const CAP: usize, E: tracewire::Encoding>(
    tracer: &DeferredTracer<E, CAP>,
) -> Vec<u8> {
    let mut sched = Scheduler::new(tracer.buffer(), CaptureSink::default());
    for _ in 0..8 {
        sched.tick();
    }
    assert!(!sched.is_draining());
    std::mem::take(&mut sched.sink_mut().bytes)
}

#[test]
fn bare_sync_stream_decodes_in_order() {
    let tracer: DeferredTracer<BareSync, 256> = DeferredTracer::new(Config::new());
    tracer.trace(EventId::new(100), &[Arg::U8(42)]);
    tracer.trace(EventId::new(257), &[Arg::U16(0xBEEF), Arg::U32(7)]);
    tracer.trace(EventId::new(3), &[]);
    let wire = drain_all(&tracer);

    let sigs: [&[ArgWidth]; 3] = [
        &[ArgWidth::B8],
        &[ArgWidth::B16, ArgWidth::B32],
        &[],
    ];
    let mut at = 0;
    let mut decoded = Vec::new();
    for sig in sigs {
        let d = BareSync::decode(&wire[at..], sig, true).unwrap();
        at += d.consumed;
        decoded.push(d);
    }
    assert_eq!(at, wire.len());
    assert_eq!(decoded[0].id, EventId::new(100));
    assert_eq!(decoded[0].args.as_slice(), &[Arg::U8(42)]);
    assert_eq!(decoded[1].id, EventId::new(257));
    assert_eq!(decoded[1].args.as_slice(), &[Arg::U16(0xBEEF), Arg::U32(7)]);
    assert_eq!(decoded[2].id, EventId::new(3));
    let cycles: Vec<u8> = decoded.iter().map(|d| d.cycle.unwrap()).collect();
    assert_eq!(cycles, vec![0, 1, 2]);
}

#[test]
fn bare_wrap_resyncs_after_line_garbage() {
    let tracer: DeferredTracer<BareWrap, 128> = DeferredTracer::new(Config::new());
    tracer.trace(EventId::new(100), &[Arg::U8(42)]);
    let wire = drain_all(&tracer);

    // Bytes lost on the line: the decoder scans to the next sync marker.
    let mut noisy = vec![0x99, 0x16, 0x00];
    noisy.extend_from_slice(&wire);
    let d = BareWrap::decode(&noisy, &[ArgWidth::B8], true).unwrap();
    assert_eq!(d.id, EventId::new(100));
    assert_eq!(d.args.as_slice(), &[Arg::U8(42)]);
    assert_eq!(d.cycle, Some(0));
    assert_eq!(d.consumed, noisy.len());
}

#[test]
fn escape_stream_with_reserved_values_round_trips() {
    let tracer: DeferredTracer<Escape, 256> = DeferredTracer::new(Config::new());
    // 0xECDE id and reserved parameter bytes force stuffing everywhere.
    tracer.trace(EventId::new(0xECDE), &[Arg::U32(0xDEEC_ECDE)]);
    tracer.trace(EventId::new(5), &[Arg::U8(0xEC)]);
    let wire = drain_all(&tracer);

    let first = Escape::decode(&wire, &[ArgWidth::B32], true).unwrap();
    assert_eq!(first.id, EventId::new(0xECDE));
    assert_eq!(first.args.as_slice(), &[Arg::U32(0xDEEC_ECDE)]);
    assert_eq!(first.cycle, Some(0));
    let second = Escape::decode(&wire[first.consumed..], &[ArgWidth::B8], true).unwrap();
    assert_eq!(second.id, EventId::new(5));
    assert_eq!(second.cycle, Some(1));
    assert_eq!(first.consumed + second.consumed, wire.len());
}

#[test]
fn pack_stream_uses_minimal_widths() {
    let tracer: DeferredTracer<Pack, 256> =
        DeferredTracer::new(Config::new().without_cycle_counter());
    tracer.trace(EventId::new(9), &[Arg::U64(1), Arg::U64(0x1_0000_0000)]);
    let wire = drain_all(&tracer);

    // One length-tagged byte for 1, five bytes for 2^32, two tags, one id.
    assert_eq!(wire.len(), 2 + (1 + 1) + (1 + 5));
    let d = Pack::decode(&wire, &[ArgWidth::B64, ArgWidth::B64], false).unwrap();
    assert_eq!(d.args.as_slice(), &[Arg::U64(1), Arg::U64(0x1_0000_0000)]);
}

#[test]
fn encrypted_escape_frame_recovers_after_decrypt() {
    let key = *b"0123456789abcdef";
    let tracer: DeferredTracer<Escape, 256> =
        DeferredTracer::new(Config::new().with_encryption(key));
    tracer.trace(EventId::new(100), &[Arg::U8(42)]);
    let wire = drain_all(&tracer);

    // Strip framing down to the padded ciphertext, then the clear cycle.
    let mut frame = tracewire::frame::FrameBuf::new();
    let consumed = Escape::unframe(&wire, 8, &mut frame).unwrap();
    let mut block = [0u8; 8];
    block.copy_from_slice(frame.as_slice());
    Xtea::from_bytes(key).decrypt_in_place(&mut block);
    assert_eq!(&block[..3], &[0x00, 0x64, 0x2A]);
    assert_eq!(&block[3..], &[0; 5]);
    // Cycle tail follows the ciphertext, unencrypted and possibly stuffed.
    let tail = &wire[consumed..];
    let cycle = match tail {
        [0xDE, c, ..] => *c,
        [c, ..] => *c,
        [] => panic!("missing cycle tail"),
    };
    assert_eq!(cycle, 0);
}

#[test]
fn overflow_burst_is_visible_as_a_cycle_gap() {
    // Capacity for four 3-byte frames; the fifth in the burst drops.
    let tracer: DeferredTracer<BareSync, 12> = DeferredTracer::new(Config::new());
    for _ in 0..5 {
        tracer.trace(EventId::new(1), &[]);
    }
    assert_eq!(tracer.stats().events(), 4);
    assert_eq!(tracer.stats().dropped_overflow(), 1);
    let wire = drain_all(&tracer);

    tracer.trace(EventId::new(1), &[]);
    let wire2 = drain_all(&tracer);

    let mut cycles = Vec::new();
    for chunk in wire.chunks(3).chain(wire2.chunks(3)) {
        let d = BareSync::decode(chunk, &[], true).unwrap();
        cycles.push(d.cycle.unwrap());
    }
    // 0..3 arrive, 4 was dropped, 5 follows: the host sees the jump.
    assert_eq!(cycles, vec![0, 1, 2, 3, 5]);
}

#[test]
fn events_during_a_slow_drain_arrive_on_the_next_swap() {
    let tracer: DeferredTracer<BareSync, 64> = DeferredTracer::new(Config::new());
    tracer.trace(EventId::new(1), &[]);
    let mut sched = Scheduler::new(tracer.buffer(), CaptureSink::throttled());
    sched.tick();
    assert!(sched.is_draining());

    // Recorded mid-drain: lands in the active half, untouched by the drain.
    tracer.trace(EventId::new(2), &[]);
    while sched.is_draining() {
        sched.on_sink_ready();
    }
    assert_eq!(sched.sink_mut().bytes, vec![0, 1, 0]);

    for _ in 0..8 {
        sched.tick();
    }
    assert_eq!(sched.sink_mut().bytes, vec![0, 1, 0, 0, 2, 1]);
}

/// Mixed-width parameter list of arity `n`, with reserved byte values in the
/// mix so the escape path is exercised too.
fn mixed_args(n: usize) -> (Vec<Arg>, Vec<ArgWidth>) {
    let mut args = Vec::new();
    let mut sig = Vec::new();
    for i in 0..n {
        let (arg, w) = match i % 4 {
            0 => (Arg::U8([0xEC, 0x42, 0xDE][i / 4 % 3]), ArgWidth::B8),
            1 => (Arg::U16(0x0100u16.wrapping_mul(i as u16) + 7), ArgWidth::B16),
            2 => (
                Arg::U32(0x0101_0101u32.wrapping_mul(i as u32 + 1)),
                ArgWidth::B32,
            ),
            _ => (Arg::U64(u64::MAX - i as u64), ArgWidth::B64),
        };
        args.push(arg);
        sig.push(w);
    }
    (args, sig)
}

fn sweep_arities<E: tracewire::Encoding>(
    decode: fn(&[u8], &[ArgWidth], bool) -> Result<tracewire::codec::Decoded, tracewire::CodecError>,
) {
    for n in 0..=tracewire::MAX_ARGS {
        let (args, sig) = mixed_args(n);
        let id = EventId::new(0x0200 + n as u16);
        let mut f = tracewire::frame::FrameBuf::new();
        tracewire::codec::encode_frame::<E>(id, &args, Some(n as u8), None, &mut f).unwrap();
        let d = decode(f.as_slice(), &sig, true).unwrap();
        assert_eq!(d.id, id, "{} arity {n}", E::NAME);
        assert_eq!(d.args.as_slice(), &args[..], "{} arity {n}", E::NAME);
        assert_eq!(d.cycle, Some(n as u8), "{} arity {n}", E::NAME);
        assert_eq!(d.consumed, f.len(), "{} arity {n}", E::NAME);
    }
}

#[test]
fn every_arity_round_trips_for_every_encoding() {
    sweep_arities::<BareSync>(BareSync::decode);
    sweep_arities::<BareWrap>(BareWrap::decode);
    sweep_arities::<Escape>(Escape::decode);
    sweep_arities::<Pack>(Pack::decode);
}

#[test]
fn direct_tracer_matches_deferred_wire_format() {
    let direct: DirectTracer<BareSync, CaptureSink> =
        DirectTracer::new(CaptureSink::default(), Config::new());
    let deferred: DeferredTracer<BareSync, 64> = DeferredTracer::new(Config::new());
    for t in 0..3u16 {
        direct.trace(EventId::new(t), &[Arg::U16(t * 7)]);
        deferred.trace(EventId::new(t), &[Arg::U16(t * 7)]);
    }
    let deferred_wire = drain_all(&deferred);
    direct.with_sink(|sink| assert_eq!(sink.bytes, deferred_wire));
}
