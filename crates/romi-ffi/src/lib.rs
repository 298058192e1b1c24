//! romi-ffi: C-ABI exports for the Romi packet reader, clock, sleeper and delay line.
//!
//! Every function returns a [`RomiResult`] (or a null handle) and leaves a
//! message for `romi_last_error` on failure. Panics never cross the boundary.

mod args;
mod callback;
mod clock;
mod error;
mod filter;
mod packet;
mod sleep;
mod types;

use std::panic::AssertUnwindSafe;

pub use clock::{romi_clock_create, romi_clock_free, romi_clock_now, romi_clock_on_overflow};
pub use filter::{
    romi_delay_line_create, romi_delay_line_destroy, romi_delay_line_fir, romi_delay_line_get,
    romi_delay_line_push, romi_delay_line_sum,
};
pub use packet::{romi_checksum, romi_drive_direct_encode, romi_packet_encode, romi_read_packet};
pub use sleep::{
    romi_sleeper_create, romi_sleeper_free, romi_sleeper_sleep_for, romi_sleeper_sleep_until,
    romi_wake_raise,
};
pub use types::{
    RomiClockHandle, RomiCounterFn, RomiDelayLineHandle, RomiIrqFn, RomiPriorityFn, RomiReadFn,
    RomiResult, RomiSleeperHandle, ROMI_ERR_CAPACITY, ROMI_ERR_CHECKSUM, ROMI_ERR_CLOSED,
    ROMI_ERR_INTERNAL, ROMI_ERR_INTERRUPTED, ROMI_ERR_INVALID_ARGUMENT, ROMI_ERR_OUT_OF_RANGE,
    ROMI_ERR_TRANSPORT, ROMI_MAX_FRAME_SIZE, ROMI_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn romi_init() -> RomiResult {
    ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        RomiResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn romi_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

#[no_mangle]
pub extern "C" fn romi_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn init_and_cleanup_are_ok() {
        assert_eq!(romi_init(), RomiResult::Ok);
        romi_cleanup();
    }

    #[test]
    fn last_error_starts_empty() {
        romi_cleanup();
        let ptr = romi_last_error();
        assert!(!ptr.is_null());

        // SAFETY: romi_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(ptr).to_str().unwrap() };
        assert!(text.is_empty());
    }

    #[test]
    fn failure_leaves_message() {
        assert!(romi_delay_line_create(0).is_null());

        // SAFETY: as above.
        let text = unsafe { CStr::from_ptr(romi_last_error()).to_str().unwrap() };
        assert!(text.contains("capacity"), "{text}");
    }

    #[test]
    fn ffi_boundary_catches_panics() {
        let rc = ffi_boundary(RomiResult::Internal, || panic!("boom"));
        assert_eq!(rc, RomiResult::Internal);

        // SAFETY: as above.
        let text = unsafe { CStr::from_ptr(romi_last_error()).to_str().unwrap() };
        assert_eq!(text, "panic across FFI boundary");
    }
}
