use core::time::Duration;

/// Errors from clock initialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The counter's tick period is not a whole number of nanoseconds.
    #[error("tick rate {hz} Hz does not divide 1 GHz")]
    InvalidTickRate { hz: u32 },
}

/// Errors from [`Sleeper`](crate::Sleeper).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SleepError {
    /// An interrupt raised the wake signal before the deadline.
    #[error("sleep interrupted by an asynchronous event")]
    Interrupted,

    /// Without an overflow interrupt the clock cannot see more than one wrap.
    #[error("sleep of {requested:?} exceeds the counter wrap period ({max:?}) and no overflow interrupt is armed")]
    DurationTooLong { requested: Duration, max: Duration },

    /// Interrupt priorities are 3 bits wide.
    #[error("priority {priority} for interrupt {irq} is out of range (0..=7)")]
    InvalidPriority { irq: u8, priority: u8 },
}
