use crate::error;

/// Convert an optional byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Convert a writable buffer pointer + capacity into a mutable slice.
///
/// # Safety
/// If `cap > 0`, `data` must be non-null and writable for `cap` bytes.
pub(crate) unsafe fn buf_arg<'a>(data: *mut u8, cap: usize, name: &str) -> Option<&'a mut [u8]> {
    if cap == 0 {
        return Some(&mut []);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when capacity > 0"));
        return None;
    }

    // SAFETY: Pointer and capacity are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts_mut(data, cap) })
}

/// Coefficient slice for FIR evaluation.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` floats.
pub(crate) unsafe fn floats_arg<'a>(data: *const f32, len: usize) -> Option<&'a [f32]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument("coeffs cannot be null when len > 0");
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Store `value` through a required out-pointer.
///
/// # Safety
/// `out` must be null or valid for a write of `T`.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T, name: &str) -> crate::RomiResult {
    if out.is_null() {
        return error::set_invalid_argument(format!("{name} cannot be null"));
    }
    // SAFETY: Non-null checked above; validity is guaranteed by the caller.
    unsafe { out.write(value) };
    crate::RomiResult::Ok
}
