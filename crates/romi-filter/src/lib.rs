//! Delay line and FIR filter for smoothing sensor samples.
//!
//! [`DelayLine`] keeps the last N `f32` samples in a ring; [`DelayLine::fir`]
//! convolves them with a coefficient slice, newest sample first.

pub mod delay_line;
pub mod error;

pub use delay_line::DelayLine;
pub use error::{FilterError, Result};
