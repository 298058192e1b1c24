use std::ffi::c_void;

use romi_clock::{Sleeper, WrappingClock};
use romi_filter::DelayLine;

use crate::callback::{CallbackCounter, CallbackInterrupts};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomiResult {
    Ok = 0,
    InvalidArgument = 1,
    Transport = 2,
    Checksum = 3,
    Capacity = 4,
    OutOfRange = 5,
    Interrupted = 6,
    Closed = 7,
    Internal = 99,
}

#[allow(dead_code)]
pub const ROMI_OK: RomiResult = RomiResult::Ok;
#[allow(dead_code)]
pub const ROMI_ERR_INVALID_ARGUMENT: RomiResult = RomiResult::InvalidArgument;
#[allow(dead_code)]
pub const ROMI_ERR_TRANSPORT: RomiResult = RomiResult::Transport;
#[allow(dead_code)]
pub const ROMI_ERR_CHECKSUM: RomiResult = RomiResult::Checksum;
#[allow(dead_code)]
pub const ROMI_ERR_CAPACITY: RomiResult = RomiResult::Capacity;
#[allow(dead_code)]
pub const ROMI_ERR_OUT_OF_RANGE: RomiResult = RomiResult::OutOfRange;
#[allow(dead_code)]
pub const ROMI_ERR_INTERRUPTED: RomiResult = RomiResult::Interrupted;
#[allow(dead_code)]
pub const ROMI_ERR_CLOSED: RomiResult = RomiResult::Closed;
#[allow(dead_code)]
pub const ROMI_ERR_INTERNAL: RomiResult = RomiResult::Internal;

/// Largest frame the robot sends; size caller buffers for `romi_read_packet` with it.
#[allow(dead_code)]
pub const ROMI_MAX_FRAME_SIZE: usize = romi_frame::MAX_FRAME_SIZE;

/// Read exactly `len` bytes into `buf`, waiting at most `timeout_us`.
///
/// Returns the number of bytes stored. Fewer than `len` is a timeout; a
/// negative value means the stream is closed.
pub type RomiReadFn =
    Option<unsafe extern "C" fn(ctx: *mut c_void, buf: *mut u8, len: usize, timeout_us: u32) -> isize>;

/// Return the current raw value of a free-running 32-bit timer.
pub type RomiCounterFn = Option<unsafe extern "C" fn(ctx: *mut c_void) -> u32>;

/// Enable or disable one interrupt line.
pub type RomiIrqFn = Option<unsafe extern "C" fn(ctx: *mut c_void, irq: u8)>;

/// Set the priority of one interrupt line.
pub type RomiPriorityFn = Option<unsafe extern "C" fn(ctx: *mut c_void, irq: u8, priority: u8)>;

pub type RomiDelayLineHandle = *mut c_void;
pub type RomiClockHandle = *mut c_void;
pub type RomiSleeperHandle = *mut c_void;

pub(crate) struct DelayLineHandle {
    pub(crate) line: DelayLine,
}

pub(crate) struct ClockHandle {
    pub(crate) clock: WrappingClock<CallbackCounter>,
}

pub(crate) struct SleeperHandle {
    pub(crate) sleeper: Sleeper<'static, CallbackInterrupts>,
}
