//! Physical clock for the Romi runtime.
//!
//! The board has a free-running 32-bit timer counting at 1 MHz, which wraps
//! about every 71.6 minutes. [`WrappingClock`] extends it to a monotonic 64-bit
//! nanosecond [`Instant`]:
//! - an overflow interrupt, when the platform has one, bumps a software high word
//! - reads that race the interrupt, or happen while it is pending or was missed,
//!   are reconciled against the previous reading so time never goes backwards
//!
//! [`Sleeper`] busy-waits on the clock with a fixed [`InterruptSet`] enabled,
//! returning early when an interrupt raises the [`WakeSignal`].
//!
//! With the default `std` feature, critical sections are provided by
//! `critical-section`'s std implementation and [`SystemCounter`] emulates the
//! hardware timer on the host. Firmware builds disable `std` and link their own
//! `critical-section` implementation.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod clock;
pub mod counter;
pub mod error;
pub mod sleep;

pub use clock::{ClockConfig, Instant, WrappingClock};
pub use counter::HardwareCounter;
#[cfg(feature = "std")]
pub use counter::SystemCounter;
pub use error::{ClockError, SleepError};
pub use sleep::{InterruptControl, InterruptSet, Sleeper, WakeSignal};
