use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use tracing::{debug, trace};

use crate::clock::{Instant, WrappingClock};
use crate::counter::HardwareCounter;
use crate::error::SleepError;

/// Highest priority the interrupt controller accepts (3 priority bits).
pub const MAX_PRIORITY: u8 = 7;

/// Access to the interrupt controller.
pub trait InterruptControl {
    fn enable(&mut self, irq: u8);
    fn disable(&mut self, irq: u8);
    fn set_priority(&mut self, irq: u8, priority: u8);
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    fn enable(&mut self, irq: u8) {
        (**self).enable(irq)
    }

    fn disable(&mut self, irq: u8) {
        (**self).disable(irq)
    }

    fn set_priority(&mut self, irq: u8, priority: u8) {
        (**self).set_priority(irq, priority)
    }
}

/// Flag an interrupt handler raises to cut a sleep short.
#[derive(Debug, Default)]
pub struct WakeSignal(AtomicBool);

impl WakeSignal {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Call from interrupt context.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Interrupts allowed to fire while sleeping, with their priorities.
///
/// A fixed bitset over interrupt numbers 0..=255.
#[derive(Clone, PartialEq, Eq)]
pub struct InterruptSet {
    members: [u64; 4],
    priorities: [u8; 256],
}

impl InterruptSet {
    pub const fn new() -> Self {
        Self {
            members: [0; 4],
            priorities: [0; 256],
        }
    }

    /// Add `irq` at `priority`. Adding an existing member updates its priority.
    pub fn with(mut self, irq: u8, priority: u8) -> Result<Self, SleepError> {
        if priority > MAX_PRIORITY {
            return Err(SleepError::InvalidPriority { irq, priority });
        }
        self.members[usize::from(irq / 64)] |= 1 << (irq % 64);
        self.priorities[usize::from(irq)] = priority;
        Ok(self)
    }

    pub fn contains(&self, irq: u8) -> bool {
        self.members[usize::from(irq / 64)] & (1 << (irq % 64)) != 0
    }

    pub fn priority(&self, irq: u8) -> Option<u8> {
        self.contains(irq).then(|| self.priorities[usize::from(irq)])
    }

    pub fn len(&self) -> usize {
        self.members.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.members.iter().all(|w| *w == 0)
    }

    /// Members in ascending order, with their priorities.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (0..=u8::MAX)
            .filter(move |irq| self.contains(*irq))
            .map(move |irq| (irq, self.priorities[usize::from(irq)]))
    }
}

impl Default for InterruptSet {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InterruptSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Waits on a [`WrappingClock`] with a fixed set of interrupts enabled.
///
/// Outside [`sleep_until`](Self::sleep_until) every member of the set is
/// disabled, so the caller runs as if in a critical section with respect to
/// them.
pub struct Sleeper<'a, I> {
    controller: I,
    interrupts: InterruptSet,
    wake: &'a WakeSignal,
}

impl<'a, I: InterruptControl> Sleeper<'a, I> {
    /// Apply each member's priority and leave it disabled.
    pub fn new(mut controller: I, interrupts: InterruptSet, wake: &'a WakeSignal) -> Self {
        for (irq, priority) in interrupts.iter() {
            controller.set_priority(irq, priority);
            controller.disable(irq);
        }
        debug!(count = interrupts.len(), "sleep interrupt set installed");
        Self {
            controller,
            interrupts,
            wake,
        }
    }

    /// Busy-wait until `clock.now() >= wakeup`.
    ///
    /// Returns [`SleepError::Interrupted`] as soon as the wake signal is
    /// raised. Interrupts in the set are enabled only for the duration of
    /// the wait.
    pub fn sleep_until<C: HardwareCounter>(
        &mut self,
        clock: &WrappingClock<C>,
        wakeup: Instant,
    ) -> Result<(), SleepError> {
        if !clock.overflow_armed() {
            let requested = wakeup.saturating_duration_since(clock.now());
            let max = clock.wrap_period();
            if requested > max {
                return Err(SleepError::DurationTooLong { requested, max });
            }
        }

        self.wake.clear();
        self.set_enabled(true);

        let result = loop {
            if self.wake.is_raised() {
                trace!("sleep interrupted");
                break Err(SleepError::Interrupted);
            }
            if clock.now() >= wakeup {
                break Ok(());
            }
            core::hint::spin_loop();
        };

        self.set_enabled(false);
        result
    }

    /// Sleep for `duration` from now.
    pub fn sleep_for<C: HardwareCounter>(
        &mut self,
        clock: &WrappingClock<C>,
        duration: Duration,
    ) -> Result<(), SleepError> {
        let wakeup = clock.now() + duration;
        self.sleep_until(clock, wakeup)
    }

    pub fn interrupts(&self) -> &InterruptSet {
        &self.interrupts
    }

    pub fn controller(&self) -> &I {
        &self.controller
    }

    fn set_enabled(&mut self, enabled: bool) {
        for (irq, _) in self.interrupts.iter() {
            if enabled {
                self.controller.enable(irq);
            } else {
                self.controller.disable(irq);
            }
        }
    }
}
