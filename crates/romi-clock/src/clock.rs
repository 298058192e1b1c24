use core::cell::Cell;
use core::ops::Add;
use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

use critical_section::Mutex;
use tracing::{debug, warn};

use crate::counter::HardwareCounter;
use crate::error::ClockError;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Raw values at or above this are in the upper half of the counter period.
const HALF_PERIOD: u32 = 1 << 31;

/// Nanoseconds since the clock was initialized.
///
/// There is no real-time reference on the board, so the epoch offset is
/// always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(u64);

impl Instant {
    pub const ZERO: Instant = Instant(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub const fn as_micros(self) -> u64 {
        self.0 / 1_000
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    pub fn checked_add(self, duration: Duration) -> Option<Instant> {
        let nanos = u64::try_from(duration.as_nanos()).ok()?;
        self.0.checked_add(nanos).map(Instant)
    }

    pub fn saturating_add(self, duration: Duration) -> Instant {
        self.checked_add(duration).unwrap_or(Instant(u64::MAX))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        self.saturating_add(rhs)
    }
}

/// Options for [`WrappingClock::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Arm the counter's overflow interrupt if it has one. Default: true.
    ///
    /// When false (or unsupported), wraps are only inferred from consecutive
    /// reads, and the clock must be read at least once per wrap period.
    pub use_overflow_interrupt: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            use_overflow_interrupt: true,
        }
    }
}

/// Monotonic 64-bit clock over a wrapping 32-bit [`HardwareCounter`].
///
/// Share it by reference between the main loop and the overflow interrupt
/// handler, which must call [`on_overflow`](Self::on_overflow) once per wrap.
/// The handler may run just after the counter wraps to 0 or, for
/// compare-at-max timers, while it still reads near `u32::MAX`.
pub struct WrappingClock<C> {
    counter: C,
    /// Overflow count in bits 1..32. Bit 0 is set when the last overflow was
    /// counted before the counter actually wrapped. Only `on_overflow`
    /// increments it.
    high: AtomicU32,
    /// Last tick value handed out by `now`.
    last: Mutex<Cell<u64>>,
    ns_per_tick: u64,
    overflow_armed: bool,
}

impl<C: HardwareCounter> WrappingClock<C> {
    /// Start `counter` and build a clock over it.
    pub fn initialize(mut counter: C, config: ClockConfig) -> Result<Self, ClockError> {
        let hz = counter.tick_hz();
        if hz == 0 || NANOS_PER_SEC % u64::from(hz) != 0 {
            return Err(ClockError::InvalidTickRate { hz });
        }
        let ns_per_tick = NANOS_PER_SEC / u64::from(hz);

        counter.start();
        let overflow_armed = config.use_overflow_interrupt && counter.arm_overflow_notify();
        if !overflow_armed {
            debug!("no overflow interrupt armed, inferring wraps from reads");
        }

        Ok(Self {
            counter,
            high: AtomicU32::new(0),
            last: Mutex::new(Cell::new(0)),
            ns_per_tick,
            overflow_armed,
        })
    }

    /// Current time. Never less than any value previously returned.
    pub fn now(&self) -> Instant {
        let ticks = critical_section::with(|cs| {
            // Read under the lock so a concurrent `now` cannot advance `last`
            // past this observation.
            let observed = self.read_ticks();
            let last = self.last.borrow(cs);
            let prev = last.get();
            let ticks = if observed < prev {
                // The counter wrapped and the high word has not caught up:
                // the interrupt is pending or was missed. Count one wrap.
                let elapsed = (observed as u32).wrapping_sub(prev as u32);
                prev + u64::from(elapsed)
            } else {
                observed
            };
            last.set(ticks);
            ticks
        });

        Instant(ticks.saturating_mul(self.ns_per_tick))
    }

    /// Overflow interrupt handler body.
    pub fn on_overflow(&self) {
        let early = u32::from(self.counter.read_raw() >= HALF_PERIOD);
        let mut state = self.high.load(Ordering::Acquire);
        loop {
            let next = ((state >> 1).wrapping_add(1) << 1) | early;
            match self
                .high
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if next >> 1 == 0 {
                        warn!("clock high word wrapped");
                    }
                    return;
                }
                Err(current) => state = current,
            }
        }
    }

    /// High word and counter read as one value.
    fn read_ticks(&self) -> u64 {
        loop {
            let state = self.high.load(Ordering::Acquire);
            let raw = self.counter.read_raw();
            // An overflow between the two loads makes `raw` ambiguous.
            if self.high.load(Ordering::Acquire) != state {
                continue;
            }
            let mut high = state >> 1;
            if state & 1 != 0 {
                if raw >= HALF_PERIOD {
                    // Counted, but the counter has not wrapped yet.
                    high = high.wrapping_sub(1);
                } else {
                    // The wrap has happened; a failed exchange means a newer
                    // overflow replaced the flag.
                    let _ = self.high.compare_exchange(
                        state,
                        state & !1,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                }
            }
            return (u64::from(high) << 32) | u64::from(raw);
        }
    }

    /// Span of one full counter period.
    pub fn wrap_period(&self) -> Duration {
        Duration::from_nanos((1u64 << 32) * self.ns_per_tick)
    }

    /// Whether the overflow interrupt was armed at initialization.
    pub fn overflow_armed(&self) -> bool {
        self.overflow_armed
    }

    /// Overflows reported through [`on_overflow`](Self::on_overflow).
    pub fn overflows(&self) -> u32 {
        self.high.load(Ordering::Acquire) >> 1
    }

    pub fn ns_per_tick(&self) -> u64 {
        self.ns_per_tick
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }
}

impl<C> core::fmt::Debug for WrappingClock<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WrappingClock")
            .field("overflows", &(self.high.load(Ordering::Relaxed) >> 1))
            .field("ns_per_tick", &self.ns_per_tick)
            .field("overflow_armed", &self.overflow_armed)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;

    /// Counter whose value the test sets directly.
    struct ManualCounter {
        raw: AtomicU32,
        hz: u32,
        has_irq: bool,
        started: bool,
        armed: AtomicBool,
    }

    impl ManualCounter {
        fn new(has_irq: bool) -> Self {
            Self {
                raw: AtomicU32::new(0),
                hz: 1_000_000,
                has_irq,
                started: false,
                armed: AtomicBool::new(false),
            }
        }

        fn set(&self, raw: u32) {
            self.raw.store(raw, Ordering::SeqCst);
        }
    }

    impl HardwareCounter for ManualCounter {
        fn start(&mut self) {
            self.started = true;
            self.raw.store(0, Ordering::SeqCst);
        }

        fn read_raw(&self) -> u32 {
            self.raw.load(Ordering::SeqCst)
        }

        fn arm_overflow_notify(&mut self) -> bool {
            self.armed.store(self.has_irq, Ordering::SeqCst);
            self.has_irq
        }

        fn tick_hz(&self) -> u32 {
            self.hz
        }
    }

    fn clock(has_irq: bool) -> WrappingClock<ManualCounter> {
        WrappingClock::initialize(ManualCounter::new(has_irq), ClockConfig::default()).unwrap()
    }

    #[test]
    fn initialize_starts_and_arms() {
        let clock = clock(true);
        assert!(clock.counter().started);
        assert!(clock.counter().armed.load(Ordering::SeqCst));
        assert!(clock.overflow_armed());
        assert_eq!(clock.now(), Instant::ZERO);
    }

    #[test]
    fn config_can_skip_interrupt() {
        let config = ClockConfig {
            use_overflow_interrupt: false,
        };
        let clock = WrappingClock::initialize(ManualCounter::new(true), config).unwrap();
        assert!(!clock.overflow_armed());
        assert!(!clock.counter().armed.load(Ordering::SeqCst));
    }

    #[test]
    fn rejects_tick_rates_without_whole_nanosecond_period() {
        for hz in [0, 3_000_000, 32_768, 16_000_000] {
            let mut counter = ManualCounter::new(false);
            counter.hz = hz;
            let err = WrappingClock::initialize(counter, ClockConfig::default()).unwrap_err();
            assert_eq!(err, ClockError::InvalidTickRate { hz });
        }

        let mut counter = ManualCounter::new(false);
        counter.hz = 8_000_000;
        let clock = WrappingClock::initialize(counter, ClockConfig::default()).unwrap();
        assert_eq!(clock.ns_per_tick(), 125);
    }

    #[test]
    fn converts_ticks_to_nanoseconds() {
        let clock = clock(true);
        clock.counter().set(1_500);
        assert_eq!(clock.now().as_nanos(), 1_500_000);
        assert_eq!(clock.now().as_micros(), 1_500);
    }

    #[test]
    fn wrap_without_interrupt_adds_elapsed_ticks() {
        let clock = clock(false);
        clock.counter().set(0xFFFF_FFF0);
        let before = clock.now();

        clock.counter().set(0x0000_0010);
        let after = clock.now();

        assert_eq!(after.as_nanos() - before.as_nanos(), 0x20 * 1_000);
        assert_eq!(after.as_nanos(), ((1u64 << 32) + 0x10) * 1_000);
    }

    #[test]
    fn polling_keeps_counting_across_several_wraps() {
        let clock = clock(false);
        for wrap in 1..=3u64 {
            clock.counter().set(0x8000_0000);
            clock.now();
            clock.counter().set(0x0000_0001);
            assert_eq!(clock.now().as_nanos(), ((wrap << 32) + 1) * 1_000);
        }
    }

    #[test]
    fn interrupt_driven_wrap() {
        let clock = clock(true);
        clock.counter().set(0xFFFF_FF00);
        let before = clock.now();

        clock.counter().set(0x100);
        clock.on_overflow();
        let after = clock.now();

        assert_eq!(clock.overflows(), 1);
        assert_eq!(after.as_nanos() - before.as_nanos(), 0x200 * 1_000);
    }

    #[test]
    fn pending_interrupt_is_not_counted_twice() {
        let clock = clock(true);
        clock.counter().set(0xFFFF_FFFF);
        let a = clock.now();

        // Wrapped, interrupt not serviced yet.
        clock.counter().set(5);
        let b = clock.now();

        clock.on_overflow();
        clock.counter().set(6);
        let c = clock.now();

        assert!(a <= b && b <= c);
        assert_eq!(b.as_nanos(), ((1u64 << 32) + 5) * 1_000);
        assert_eq!(c.as_nanos(), ((1u64 << 32) + 6) * 1_000);
    }

    #[test]
    fn missed_interrupt_recovers_on_next_one() {
        let clock = clock(true);
        clock.counter().set(0xFFFF_0000);
        clock.now();

        // First wrap: the interrupt never arrives.
        clock.counter().set(0x10);
        assert_eq!(clock.now().as_nanos(), ((1u64 << 32) + 0x10) * 1_000);
        clock.counter().set(0xFFFF_0000);
        clock.now();

        // Second wrap: the interrupt fires, but the high word is one behind.
        clock.counter().set(0x20);
        clock.on_overflow();
        assert_eq!(clock.now().as_nanos(), ((2u64 << 32) + 0x20) * 1_000);
    }

    #[test]
    fn compare_at_max_interrupt_before_wrap() {
        let clock = clock(true);
        clock.counter().set(0xFFFF_FFF0);
        let t0 = clock.now();

        // Serviced while the counter still reads its top value.
        clock.counter().set(0xFFFF_FFFF);
        clock.on_overflow();
        let t1 = clock.now();

        clock.counter().set(5);
        let t2 = clock.now();

        clock.counter().set(0xFFFF_FF00);
        let t3 = clock.now();

        assert_eq!(clock.overflows(), 1);
        assert_eq!(t0.as_nanos(), 0xFFFF_FFF0 * 1_000);
        assert_eq!(t1.as_nanos(), 0xFFFF_FFFF * 1_000);
        assert_eq!(t2.as_nanos(), ((1u64 << 32) + 5) * 1_000);
        assert_eq!(t3.as_nanos(), ((1u64 << 32) + 0xFFFF_FF00) * 1_000);
    }

    /// Counter that parks the first read after `hold` until `release`.
    struct GatedCounter {
        raw: AtomicU32,
        hold: AtomicBool,
        parked: AtomicBool,
        release: AtomicBool,
    }

    impl HardwareCounter for GatedCounter {
        fn start(&mut self) {}

        fn read_raw(&self) -> u32 {
            let raw = self.raw.load(Ordering::SeqCst);
            if self.hold.swap(false, Ordering::SeqCst) {
                self.parked.store(true, Ordering::SeqCst);
                while !self.release.load(Ordering::SeqCst) {
                    std::thread::yield_now();
                }
            }
            raw
        }

        fn arm_overflow_notify(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn stale_reading_does_not_add_a_wrap() {
        let counter = GatedCounter {
            raw: AtomicU32::new(0),
            hold: AtomicBool::new(false),
            parked: AtomicBool::new(false),
            release: AtomicBool::new(false),
        };
        let clock = WrappingClock::initialize(counter, ClockConfig::default()).unwrap();
        let gate = clock.counter();
        gate.raw.store(0xFFFF_FF00, Ordering::SeqCst);
        gate.hold.store(true, Ordering::SeqCst);

        let (a, b) = std::thread::scope(|s| {
            let first = s.spawn(|| clock.now());
            while !gate.parked.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }

            // Wrapped while the first reader holds its old value; the
            // interrupt has not run yet.
            gate.raw.store(0x100, Ordering::SeqCst);
            let second = s.spawn(|| clock.now());
            std::thread::sleep(std::time::Duration::from_millis(50));
            gate.release.store(true, Ordering::SeqCst);

            (first.join().unwrap(), second.join().unwrap())
        });

        let wrapped = ((1u64 << 32) + 0x100) * 1_000;
        assert_eq!(a.as_nanos(), 0xFFFF_FF00 * 1_000);
        assert_eq!(b.as_nanos(), wrapped);
        assert_eq!(clock.now().as_nanos(), wrapped);
    }

    #[test]
    fn wrap_period_at_one_megahertz() {
        let clock = clock(false);
        assert_eq!(clock.wrap_period(), Duration::from_micros(1u64 << 32));
    }

    #[test]
    fn never_decreases_with_concurrent_interrupts() {
        const WRAPS: u64 = 200;
        let clock = clock(true);
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            let reader = s.spawn(|| {
                let mut prev = Instant::ZERO;
                while !done.load(Ordering::Acquire) {
                    let now = clock.now();
                    assert!(now >= prev, "{now:?} < {prev:?}");
                    prev = now;
                }
            });

            for _ in 0..WRAPS {
                clock.counter().set(0xFFFF_FF00);
                clock.counter().set(0x100);
                clock.on_overflow();
            }
            done.store(true, Ordering::Release);
            reader.join().unwrap();
        });

        assert_eq!(clock.now().as_nanos(), ((WRAPS << 32) | 0x100) * 1_000);
    }

    #[test]
    fn instant_arithmetic() {
        let t = Instant::from_nanos(1_000);
        assert_eq!((t + Duration::from_nanos(500)).as_nanos(), 1_500);
        assert_eq!(Instant::from_nanos(u64::MAX) + Duration::from_secs(1), Instant::from_nanos(u64::MAX));
        assert_eq!(t.saturating_duration_since(Instant::from_nanos(2_000)), Duration::ZERO);
        assert_eq!(Instant::from_nanos(3_000).saturating_duration_since(t), Duration::from_nanos(2_000));
        assert_eq!(t.checked_add(Duration::MAX), None);
    }
}
