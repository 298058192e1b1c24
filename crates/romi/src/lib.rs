//! Host-side toolkit for the Romi differential-drive robot.
//!
//! romi talks to the robot's base controller over a serial line and provides
//! the timing primitives its firmware relies on.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transport abstraction (std streams, POSIX serial)
//! - [`frame`]: `AA 55` checksummed framing, drive commands, sensor feedback
//! - [`clock`]: wrap-safe 64-bit clock over a 32-bit counter, interruptible sleep
//! - [`filter`]: delay line and FIR filter
//! - [`robot`]: a [`Robot`] handle tying the link together

pub mod robot;

pub use robot::Robot;

/// Re-export transport types.
pub mod transport {
    pub use romi_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use romi_frame::*;
}

/// Re-export clock types.
pub mod clock {
    pub use romi_clock::*;
}

/// Re-export filter types.
pub mod filter {
    pub use romi_filter::*;
}
