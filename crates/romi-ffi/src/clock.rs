use std::ffi::c_void;

use romi_clock::{ClockConfig, WrappingClock};

use crate::args;
use crate::callback::CallbackCounter;
use crate::error;
use crate::types::{ClockHandle, RomiClockHandle, RomiCounterFn, RomiResult};

pub(crate) fn with_clock<T>(handle: RomiClockHandle, on_error: T, f: impl FnOnce(&ClockHandle) -> T) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("clock handle cannot be null");
        return on_error;
    }

    let clock_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &*(handle as *const ClockHandle) }
    };

    f(clock_handle)
}

/// Build a clock over a free-running 32-bit timer the caller has started.
///
/// Pass `has_overflow_irq = true` only if the timer's overflow interrupt will
/// call `romi_clock_on_overflow`. Returns null on error.
///
/// # Safety
/// `read_fn` and `ctx` must stay valid until `romi_clock_free`.
#[no_mangle]
pub unsafe extern "C" fn romi_clock_create(
    read_fn: RomiCounterFn,
    ctx: *mut c_void,
    tick_hz: u32,
    has_overflow_irq: bool,
) -> RomiClockHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let Some(read_fn) = read_fn else {
            let _ = error::set_invalid_argument("read_fn cannot be null");
            return std::ptr::null_mut();
        };

        let counter = CallbackCounter::new(read_fn, ctx, tick_hz, has_overflow_irq);
        match WrappingClock::initialize(counter, ClockConfig::default()) {
            Ok(clock) => Box::into_raw(Box::new(ClockHandle { clock })) as RomiClockHandle,
            Err(err) => {
                let _ = error::map_clock_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Overflow interrupt handler body.
///
/// # Safety
/// `clock` must be a valid clock handle.
#[no_mangle]
pub unsafe extern "C" fn romi_clock_on_overflow(clock: RomiClockHandle) {
    crate::ffi_boundary((), || {
        with_clock(clock, (), |handle| handle.clock.on_overflow());
    });
}

/// Nanoseconds since `romi_clock_create`.
///
/// # Safety
/// `clock` must be a valid clock handle; `out_ns` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn romi_clock_now(clock: RomiClockHandle, out_ns: *mut u64) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_clock(clock, RomiResult::InvalidArgument, |handle| {
            // SAFETY: Out-pointer validity is guaranteed by the caller.
            unsafe { args::write_out(out_ns, handle.clock.now().as_nanos(), "out_ns") }
        })
    })
}

/// Free a clock handle.
///
/// # Safety
/// `clock` must be null or a handle previously returned by `romi_clock_create`, and no
/// interrupt handler may use it afterwards.
#[no_mangle]
pub unsafe extern "C" fn romi_clock_free(clock: RomiClockHandle) {
    crate::ffi_boundary((), || {
        if clock.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by romi_clock_create.
        unsafe {
            drop(Box::from_raw(clock as *mut ClockHandle));
        }
    });
}
