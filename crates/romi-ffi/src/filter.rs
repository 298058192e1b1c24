use romi_filter::DelayLine;

use crate::args;
use crate::error;
use crate::types::{DelayLineHandle, RomiDelayLineHandle, RomiResult};

fn with_line_mut<T>(
    handle: RomiDelayLineHandle,
    on_error: T,
    f: impl FnOnce(&mut DelayLineHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("delay line handle cannot be null");
        return on_error;
    }

    let line_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut DelayLineHandle) }
    };

    f(line_handle)
}

/// Create a zero-filled delay line holding `capacity` samples.
///
/// Returns null on error; see `romi_last_error`.
#[no_mangle]
pub extern "C" fn romi_delay_line_create(capacity: usize) -> RomiDelayLineHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match DelayLine::new(capacity) {
            Ok(line) => Box::into_raw(Box::new(DelayLineHandle { line })) as RomiDelayLineHandle,
            Err(err) => {
                let _ = error::map_filter_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Free a delay line.
///
/// # Safety
/// `line` must be null or a handle previously returned by `romi_delay_line_create`.
#[no_mangle]
pub unsafe extern "C" fn romi_delay_line_destroy(line: RomiDelayLineHandle) {
    crate::ffi_boundary((), || {
        if line.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by romi_delay_line_create.
        unsafe {
            drop(Box::from_raw(line as *mut DelayLineHandle));
        }
    });
}

/// Append a sample, overwriting the oldest.
///
/// # Safety
/// `line` must be a valid delay line handle.
#[no_mangle]
pub unsafe extern "C" fn romi_delay_line_push(line: RomiDelayLineHandle, x: f32) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_line_mut(line, RomiResult::InvalidArgument, |handle| {
            handle.line.push(x);
            RomiResult::Ok
        })
    })
}

/// Sample written `lag` pushes ago (0 is the newest).
///
/// # Safety
/// `line` must be a valid delay line handle and `out` writable.
#[no_mangle]
pub unsafe extern "C" fn romi_delay_line_get(
    line: RomiDelayLineHandle,
    lag: usize,
    out: *mut f32,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_line_mut(line, RomiResult::InvalidArgument, |handle| {
            match handle.line.get(lag) {
                // SAFETY: Out-pointer validity is guaranteed by the caller.
                Ok(x) => unsafe { args::write_out(out, x, "out") },
                Err(err) => error::map_filter_error(&err),
            }
        })
    })
}

/// Sum of all samples.
///
/// # Safety
/// `line` must be a valid delay line handle and `out` writable.
#[no_mangle]
pub unsafe extern "C" fn romi_delay_line_sum(line: RomiDelayLineHandle, out: *mut f32) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_line_mut(line, RomiResult::InvalidArgument, |handle| {
            // SAFETY: Out-pointer validity is guaranteed by the caller.
            unsafe { args::write_out(out, handle.line.sum(), "out") }
        })
    })
}

/// FIR output `Σ coeffs[i] * x[n-i]` over `min(capacity, len)` taps.
///
/// # Safety
/// `line` must be a valid delay line handle. If `len > 0`, `coeffs` must be readable for `len`
/// floats. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn romi_delay_line_fir(
    line: RomiDelayLineHandle,
    coeffs: *const f32,
    len: usize,
    out: *mut f32,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();

        let coeffs = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::floats_arg(coeffs, len) } {
                Some(v) => v,
                None => return RomiResult::InvalidArgument,
            }
        };

        with_line_mut(line, RomiResult::InvalidArgument, |handle| {
            // SAFETY: Out-pointer validity is guaranteed by the caller.
            unsafe { args::write_out(out, handle.line.fir(coeffs), "out") }
        })
    })
}
