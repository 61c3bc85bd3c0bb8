use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

use super::irq::IrqControl;

/// IRQ-safe spinlock with two acquisition modes.
///
/// - [`lock`](Self::lock) disables interrupts, spins, and restores the saved
///   interrupt state on drop. Safe from IRQ context and normal kernel context.
/// - [`lock_plain`](Self::lock_plain) spins on the same flag but leaves the
///   interrupt state alone. Use it where interrupts are already masked (an
///   IRQ handler) or where the protected data is never touched from an IRQ.
///
/// Both modes guarantee the same exclusivity. Not fair. Not reentrant.
pub struct IrqSpinLock<T, I: IrqControl> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
    _irq: PhantomData<I>,
}

// SAFETY: access to `data` is serialized by `locked`.
unsafe impl<T: Send, I: IrqControl> Send for IrqSpinLock<T, I> {}
unsafe impl<T: Send, I: IrqControl> Sync for IrqSpinLock<T, I> {}

impl<T, I: IrqControl> IrqSpinLock<T, I> {
    /// Create a new IRQ-safe spinlock.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
            _irq: PhantomData,
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn spin_acquire(&self) {
        while !self.try_acquire() {
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    /// Acquire the lock with interrupts disabled.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T, I> {
        // Interrupts go off before the flag is taken, so an IRQ on this core
        // can never spin against a holder it preempted.
        let irq_state = I::disable();
        self.spin_acquire();

        IrqSpinLockGuard {
            lock: self,
            irq_state: Some(irq_state),
            _not_send: PhantomData,
        }
    }

    /// Acquire the lock without touching the interrupt state.
    pub fn lock_plain(&self) -> IrqSpinLockGuard<'_, T, I> {
        self.spin_acquire();

        IrqSpinLockGuard {
            lock: self,
            irq_state: None,
            _not_send: PhantomData,
        }
    }

    /// Try to acquire the lock with interrupts disabled, without spinning.
    ///
    /// On failure the interrupt state is restored before returning.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T, I>> {
        let irq_state = I::disable();
        if self.try_acquire() {
            Some(IrqSpinLockGuard {
                lock: self,
                irq_state: Some(irq_state),
                _not_send: PhantomData,
            })
        } else {
            I::restore(irq_state);
            None
        }
    }

    /// Whether some guard currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Exclusive access through `&mut self`; no locking required.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// Guard returned by the `IrqSpinLock` acquisition methods.
///
/// Releases the lock on drop, then restores the interrupt state if this guard
/// masked interrupts.
///
/// The saved interrupt state belongs to the CPU that took the lock, so a
/// guard cannot leave its thread:
///
/// ```compile_fail
/// use common::sync::{IrqSpinLock, NoIrq};
///
/// let lock: IrqSpinLock<u32, NoIrq> = IrqSpinLock::new(0);
/// std::thread::scope(|s| {
///     let guard = lock.lock();
///     s.spawn(move || drop(guard));
/// });
/// ```
///
/// Sharing `&guard` hands out `&T`, so it needs `T: Sync`:
///
/// ```compile_fail
/// use core::cell::Cell;
/// use common::sync::{IrqSpinLock, NoIrq};
///
/// let lock: IrqSpinLock<Cell<u32>, NoIrq> = IrqSpinLock::new(Cell::new(0));
/// let guard = lock.lock();
/// std::thread::scope(|s| {
///     let shared = &guard;
///     s.spawn(move || shared.set(shared.get() + 1));
/// });
/// ```
pub struct IrqSpinLockGuard<'a, T, I: IrqControl> {
    lock: &'a IrqSpinLock<T, I>,
    irq_state: Option<I::State>,
    _not_send: PhantomData<*const ()>,
}

// SAFETY: a shared guard only exposes `&T`.
unsafe impl<T: Sync, I: IrqControl> Sync for IrqSpinLockGuard<'_, T, I> {}

impl<T, I: IrqControl> IrqSpinLockGuard<'_, T, I> {
    /// Whether this guard masked interrupts when it was taken.
    pub fn masks_interrupts(&self) -> bool {
        self.irq_state.is_some()
    }
}

impl<'a, T, I: IrqControl> core::ops::Deref for IrqSpinLockGuard<'a, T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T, I: IrqControl> core::ops::DerefMut for IrqSpinLockGuard<'a, T, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T, I: IrqControl> Drop for IrqSpinLockGuard<'a, T, I> {
    fn drop(&mut self) {
        // Release lock first
        self.lock.locked.store(false, Ordering::Release);

        if let Some(state) = self.irq_state.take() {
            I::restore(state);
        }
    }
}
