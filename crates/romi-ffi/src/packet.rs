use std::ffi::c_void;

use bytes::BytesMut;
use romi_frame::{DriveCommand, ReaderConfig, FRAME_OVERHEAD};

use crate::args;
use crate::callback::CallbackTransport;
use crate::error;
use crate::types::{RomiReadFn, RomiResult};

/// Copy an encoded frame into a caller buffer.
fn copy_frame_out(frame: &[u8], out_buf: *mut u8, out_cap: usize, out_len: *mut usize) -> RomiResult {
    if out_len.is_null() {
        return error::set_invalid_argument("out_len cannot be null");
    }
    if frame.len() > out_cap {
        error::set_error_message(format!(
            "frame of {} bytes does not fit in a {out_cap}-byte buffer",
            frame.len()
        ));
        return RomiResult::Capacity;
    }

    let out = {
        // SAFETY: We validate pointer/capacity pairing in helper.
        match unsafe { args::buf_arg(out_buf, out_cap, "out_buf") } {
            Some(v) => v,
            None => return RomiResult::InvalidArgument,
        }
    };
    out[..frame.len()].copy_from_slice(frame);

    // SAFETY: Non-null checked above; validity is guaranteed by the caller.
    unsafe { out_len.write(frame.len()) };
    RomiResult::Ok
}

/// XOR checksum of `len` bytes at `data`.
///
/// # Safety
/// If `len > 0`, `data` must be readable for `len` bytes. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn romi_checksum(data: *const u8, len: usize, out: *mut u8) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();

        let bytes = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return RomiResult::InvalidArgument,
            }
        };

        // SAFETY: Out-pointer validity is guaranteed by the caller.
        unsafe { args::write_out(out, romi_frame::checksum(bytes), "out") }
    })
}

/// Frame `len` payload bytes into `out_buf` (header, length, payload, checksum).
///
/// # Safety
/// If `len > 0`, `payload` must be readable for `len` bytes. `out_buf` must be writable for
/// `out_cap` bytes and `out_len` must be writable.
#[no_mangle]
pub unsafe extern "C" fn romi_packet_encode(
    payload: *const u8,
    len: usize,
    out_buf: *mut u8,
    out_cap: usize,
    out_len: *mut usize,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();

        let payload = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(payload, len, "payload") } {
                Some(v) => v,
                None => return RomiResult::InvalidArgument,
            }
        };

        let mut frame = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
        if let Err(err) = romi_frame::encode_packet(payload, &mut frame) {
            return error::map_frame_error(&err);
        }
        copy_frame_out(&frame, out_buf, out_cap, out_len)
    })
}

/// Encode a complete drive frame from independent wheel speeds (mm/s).
///
/// # Safety
/// `out_buf` must be writable for `out_cap` bytes and `out_len` must be writable.
#[no_mangle]
pub unsafe extern "C" fn romi_drive_direct_encode(
    left_wheel_speed: i16,
    right_wheel_speed: i16,
    out_buf: *mut u8,
    out_cap: usize,
    out_len: *mut usize,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();

        let command = DriveCommand::from_wheel_speeds(left_wheel_speed, right_wheel_speed);
        let mut frame = BytesMut::with_capacity(FRAME_OVERHEAD + 6);
        if let Err(err) = romi_frame::encode_packet(&command.to_payload(), &mut frame) {
            return error::map_frame_error(&err);
        }
        copy_frame_out(&frame, out_buf, out_cap, out_len)
    })
}

/// Read one validated frame through `read_fn` into `buf`.
///
/// `max_len` is the capacity of `buf` and must exceed 4. On success `*out_len`
/// holds the total frame length and `buf` the complete frame.
///
/// # Safety
/// `read_fn` must be a valid callback for the duration of the call and `ctx` whatever it
/// expects. `buf` must be writable for `max_len` bytes and `out_len` must be writable.
#[no_mangle]
pub unsafe extern "C" fn romi_read_packet(
    read_fn: RomiReadFn,
    ctx: *mut c_void,
    buf: *mut u8,
    max_len: usize,
    out_len: *mut usize,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();

        let Some(read_fn) = read_fn else {
            return error::set_invalid_argument("read_fn cannot be null");
        };
        if out_len.is_null() {
            return error::set_invalid_argument("out_len cannot be null");
        }
        let buf = {
            // SAFETY: We validate pointer/capacity pairing in helper.
            match unsafe { args::buf_arg(buf, max_len, "buf") } {
                Some(v) => v,
                None => return RomiResult::InvalidArgument,
            }
        };

        let config = ReaderConfig {
            discard_stale_input: false,
            ..ReaderConfig::default()
        };
        let mut transport = CallbackTransport::new(read_fn, ctx);
        match romi_frame::read_packet(&mut transport, buf, &config) {
            // SAFETY: Non-null checked above; validity is guaranteed by the caller.
            Ok(n) => unsafe { args::write_out(out_len, n, "out_len") },
            Err(err) => error::map_frame_error(&err),
        }
    })
}
