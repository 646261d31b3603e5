//! Critical-section lock guarding the tracer's shared state.
//!
//! Trace calls may come from normal program flow and from interrupt
//! handlers, so mutual exclusion alone is not enough: on a single core, a
//! spinning lock taken in an interrupt against its own interrupted owner is
//! a deadlock. `IrqLock` therefore masks interrupts before taking the spin
//! lock and restores the saved state after releasing it.
//!
//! The crate is target-agnostic, so the mask/restore pair is an installable
//! hook: the embedder registers its architecture's primitives once at init
//! (PRIMASK save/disable on Cortex-M, `cli`/flag restore on x86). Without
//! hooks the lock degrades to a plain spin mutex, which is what hosted tests
//! want.
//!
//! Every region guarded by this lock is O(1) — pointer, cursor, and counter
//! updates only in the deferred path; the transient path holds it for one
//! event's encode. Interrupt latency stays bounded and payload-independent.

use core::ops::{Deref, DerefMut};

use conquer_once::spin::OnceCell;
use spin::{Mutex, MutexGuard};

/// Saves the current interrupt state and disables interrupts.
pub type IrqAcquireFn = fn() -> usize;

/// Restores a previously saved interrupt state.
pub type IrqReleaseFn = fn(usize);

static IRQ_HOOKS: OnceCell<(IrqAcquireFn, IrqReleaseFn)> = OnceCell::uninit();

/// Install the target's interrupt mask/restore primitives.
///
/// Call once during bring-up, before the first trace call that can race an
/// interrupt. Later calls are ignored; the first registration wins.
pub fn install_irq_hooks(acquire: IrqAcquireFn, release: IrqReleaseFn) {
    let _ = IRQ_HOOKS.try_init_once(|| (acquire, release));
}

#[inline(always)]
fn irq_save() -> usize {
    match IRQ_HOOKS.try_get() {
        Ok(&(acquire, _)) => acquire(),
        Err(_) => 0,
    }
}

#[inline(always)]
fn irq_restore(saved: usize) {
    if let Ok(&(_, release)) = IRQ_HOOKS.try_get() {
        release(saved);
    }
}

/// A spin mutex that also masks interrupts while held.
pub struct IrqLock<T> {
    inner: Mutex<T>,
}

impl<T> IrqLock<T> {
    /// Create a new unlocked lock around `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Enter the critical section.
    ///
    /// Interrupts are masked first so the lock can never spin against an
    /// interrupted owner on the same core; the guard restores the saved
    /// state on drop.
    pub fn lock(&self) -> IrqLockGuard<'_, T> {
        let saved = irq_save();
        IrqLockGuard {
            guard: Some(self.inner.lock()),
            saved,
        }
    }
}

/// RAII guard: releases the lock, then restores the interrupt state.
///
/// The release order matters: dropping the spin lock strictly before
/// unmasking interrupts, otherwise an interrupt arriving in between would
/// spin forever against its own interrupted context.
pub struct IrqLockGuard<'a, T> {
    guard: Option<MutexGuard<'a, T>>,
    saved: usize,
}

impl<T> Deref for IrqLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Invariant: `guard` is Some until drop.
        self.guard.as_ref().unwrap()
    }
}

impl<T> DerefMut for IrqLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard.as_mut().unwrap()
    }
}

impl<T> Drop for IrqLockGuard<'_, T> {
    fn drop(&mut self) {
        self.guard = None; // release the spin lock
        irq_restore(self.saved);
    }
}
