//! The `trace!` front end.
//!
//! Call sites name an event id and up to twelve unsigned values; everything
//! else (width tagging, dispatch to the installed engine) happens here. The
//! parameter-count limit is enforced at compile time so an over-long call
//! site fails the build instead of silently dropping at run time.

/// Record one trace event through the global engine.
///
/// ```
/// use tracewire::trace;
///
/// trace!(100);
/// trace!(100, 42u8);
/// trace!(257, 1u8, 0xBEEFu16, 7u32);
/// ```
#[macro_export]
macro_rules! trace {
    ($id:expr) => {
        $crate::tracer::dispatch($id, &[])
    };
    ($id:expr, $($arg:expr),+ $(,)?) => {{
        const _: () = assert!(
            [$(stringify!($arg)),+].len() <= $crate::event::MAX_ARGS,
            "trace! takes at most 12 parameters"
        );
        $crate::tracer::dispatch($id, &[$($crate::event::Arg::from($arg)),+])
    }};
}

#[cfg(test)]
mod tests {
    // Expansion-only checks; routing is covered by the tracer tests.
    #[test]
    fn expands_for_every_arity() {
        trace!(1);
        trace!(2, 0u8);
        trace!(3, 1u8, 2u16, 3u32, 4u64);
        trace!(4, 1u8, 2u8, 3u8, 4u8, 5u8, 6u8, 7u8, 8u8, 9u8, 10u8, 11u8, 12u8);
        trace!(5, 0xFFu8,);
    }
}
