use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use romi_clock::{ClockError, SleepError};
use romi_filter::FilterError;
use romi_frame::FrameError;
use romi_transport::TransportError;

use crate::types::RomiResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> RomiResult {
    set_error_message(message);
    RomiResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_frame_error(err: &FrameError) -> RomiResult {
    set_error_message(err.to_string());
    match err {
        FrameError::BufferTooSmall { .. }
        | FrameError::PayloadTooLarge { .. }
        | FrameError::InvalidHeader
        | FrameError::Truncated { .. }
        | FrameError::MalformedFeedback { .. } => RomiResult::InvalidArgument,
        FrameError::Capacity { .. } => RomiResult::Capacity,
        FrameError::ChecksumMismatch { .. } | FrameError::ChecksumBudgetExhausted { .. } => {
            RomiResult::Checksum
        }
        FrameError::Transport(TransportError::Closed) | FrameError::ConnectionClosed => {
            RomiResult::Closed
        }
        FrameError::TransportBudgetExhausted { .. } | FrameError::Transport(_) => {
            RomiResult::Transport
        }
    }
}

pub(crate) fn map_filter_error(err: &FilterError) -> RomiResult {
    set_error_message(err.to_string());
    match err {
        FilterError::ZeroCapacity => RomiResult::InvalidArgument,
        FilterError::LagOutOfRange { .. } => RomiResult::OutOfRange,
    }
}

pub(crate) fn map_clock_error(err: &ClockError) -> RomiResult {
    set_error_message(err.to_string());
    match err {
        ClockError::InvalidTickRate { .. } => RomiResult::InvalidArgument,
    }
}

pub(crate) fn map_sleep_error(err: &SleepError) -> RomiResult {
    set_error_message(err.to_string());
    match err {
        SleepError::Interrupted => RomiResult::Interrupted,
        SleepError::DurationTooLong { .. } => RomiResult::OutOfRange,
        SleepError::InvalidPriority { .. } => RomiResult::InvalidArgument,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
