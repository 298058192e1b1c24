/// A free-running 32-bit up-counter.
///
/// `read_raw` takes `&self` because the clock is read from both thread and
/// interrupt context; implementations read a register or an atomic.
pub trait HardwareCounter {
    /// Clear the counter and start it.
    fn start(&mut self);

    /// Current counter value. Wraps from `u32::MAX` to 0.
    fn read_raw(&self) -> u32;

    /// Enable the overflow interrupt. Returns `false` if the platform has none,
    /// in which case the clock falls back to wrap inference on every read.
    fn arm_overflow_notify(&mut self) -> bool {
        false
    }

    /// Counting frequency.
    fn tick_hz(&self) -> u32 {
        1_000_000
    }
}

impl<T: HardwareCounter + ?Sized> HardwareCounter for &mut T {
    fn start(&mut self) {
        (**self).start()
    }

    fn read_raw(&self) -> u32 {
        (**self).read_raw()
    }

    fn arm_overflow_notify(&mut self) -> bool {
        (**self).arm_overflow_notify()
    }

    fn tick_hz(&self) -> u32 {
        (**self).tick_hz()
    }
}

/// Host emulation of the 1 MHz timer, driven by `std::time::Instant`.
///
/// Has no overflow interrupt.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemCounter {
    origin: Option<std::time::Instant>,
    preload: u32,
}

#[cfg(feature = "std")]
impl SystemCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `raw` instead of zero, e.g. just below the wrap.
    pub fn with_preload(raw: u32) -> Self {
        Self {
            origin: None,
            preload: raw,
        }
    }
}

#[cfg(feature = "std")]
impl HardwareCounter for SystemCounter {
    fn start(&mut self) {
        self.origin = Some(std::time::Instant::now());
    }

    fn read_raw(&self) -> u32 {
        match self.origin {
            // Truncation is the wrap.
            Some(origin) => self.preload.wrapping_add(origin.elapsed().as_micros() as u32),
            None => self.preload,
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn stopped_counter_holds_preload() {
        let counter = SystemCounter::with_preload(42);
        assert_eq!(counter.read_raw(), 42);
        assert_eq!(counter.tick_hz(), 1_000_000);
    }

    #[test]
    fn started_counter_advances() {
        let mut counter = SystemCounter::new();
        counter.start();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(counter.read_raw() >= 2_000);
    }

    #[test]
    fn preload_wraps() {
        let mut counter = SystemCounter::with_preload(u32::MAX - 10);
        counter.start();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(counter.read_raw() < 1_000_000);
    }

    #[test]
    fn has_no_overflow_interrupt() {
        let mut counter = SystemCounter::new();
        assert!(!counter.arm_overflow_notify());
    }
}
