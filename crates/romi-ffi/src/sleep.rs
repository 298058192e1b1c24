use romi_clock::{InterruptSet, Instant, Sleeper, WakeSignal};

use crate::callback::CallbackInterrupts;
use crate::clock::with_clock;
use crate::error;
use crate::types::{
    RomiClockHandle, RomiIrqFn, RomiPriorityFn, RomiResult, RomiSleeperHandle, SleeperHandle,
};

/// Raised by `romi_wake_raise`; shared by every sleeper in the process.
static WAKE: WakeSignal = WakeSignal::new();

fn with_sleeper_mut<T>(
    handle: RomiSleeperHandle,
    on_error: T,
    f: impl FnOnce(&mut SleeperHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("sleeper handle cannot be null");
        return on_error;
    }

    let sleeper_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut SleeperHandle) }
    };

    f(sleeper_handle)
}

/// Build a sleeper over `count` interrupts with their priorities.
///
/// Each interrupt gets its priority and is disabled before this returns.
/// Returns null on error.
///
/// # Safety
/// The callbacks and `ctx` must stay valid until `romi_sleeper_free`. If `count > 0`, `irqs`
/// and `priorities` must be readable for `count` bytes each.
#[no_mangle]
pub unsafe extern "C" fn romi_sleeper_create(
    enable_fn: RomiIrqFn,
    disable_fn: RomiIrqFn,
    set_priority_fn: RomiPriorityFn,
    ctx: *mut std::ffi::c_void,
    irqs: *const u8,
    priorities: *const u8,
    count: usize,
) -> RomiSleeperHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let (Some(enable), Some(disable), Some(set_priority)) = (enable_fn, disable_fn, set_priority_fn)
        else {
            let _ = error::set_invalid_argument("interrupt callbacks cannot be null");
            return std::ptr::null_mut();
        };

        let (irqs, priorities) = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe {
                (
                    crate::args::bytes_arg(irqs, count, "irqs"),
                    crate::args::bytes_arg(priorities, count, "priorities"),
                )
            } {
                (Some(i), Some(p)) => (i, p),
                _ => return std::ptr::null_mut(),
            }
        };

        let mut set = InterruptSet::new();
        for (&irq, &priority) in irqs.iter().zip(priorities) {
            set = match set.with(irq, priority) {
                Ok(set) => set,
                Err(err) => {
                    let _ = error::map_sleep_error(&err);
                    return std::ptr::null_mut();
                }
            };
        }

        let controller = CallbackInterrupts {
            enable,
            disable,
            set_priority,
            ctx,
        };
        let sleeper = Sleeper::new(controller, set, &WAKE);
        Box::into_raw(Box::new(SleeperHandle { sleeper })) as RomiSleeperHandle
    })
}

/// Busy-wait until `clock` reads at least `wakeup_ns`, with the sleeper's
/// interrupts enabled. Returns `Interrupted` if `romi_wake_raise` was called.
///
/// # Safety
/// `sleeper` and `clock` must be valid handles.
#[no_mangle]
pub unsafe extern "C" fn romi_sleeper_sleep_until(
    sleeper: RomiSleeperHandle,
    clock: RomiClockHandle,
    wakeup_ns: u64,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_clock(clock, RomiResult::InvalidArgument, |clock| {
            with_sleeper_mut(sleeper, RomiResult::InvalidArgument, |handle| {
                match handle
                    .sleeper
                    .sleep_until(&clock.clock, Instant::from_nanos(wakeup_ns))
                {
                    Ok(()) => RomiResult::Ok,
                    Err(err) => error::map_sleep_error(&err),
                }
            })
        })
    })
}

/// Relative form of `romi_sleeper_sleep_until`.
///
/// # Safety
/// `sleeper` and `clock` must be valid handles.
#[no_mangle]
pub unsafe extern "C" fn romi_sleeper_sleep_for(
    sleeper: RomiSleeperHandle,
    clock: RomiClockHandle,
    duration_ns: u64,
) -> RomiResult {
    crate::ffi_boundary(RomiResult::Internal, || {
        error::clear_error_state();
        with_clock(clock, RomiResult::InvalidArgument, |clock| {
            with_sleeper_mut(sleeper, RomiResult::InvalidArgument, |handle| {
                match handle
                    .sleeper
                    .sleep_for(&clock.clock, std::time::Duration::from_nanos(duration_ns))
                {
                    Ok(()) => RomiResult::Ok,
                    Err(err) => error::map_sleep_error(&err),
                }
            })
        })
    })
}

/// Cut the current sleep short. Safe to call from interrupt context.
#[no_mangle]
pub extern "C" fn romi_wake_raise() {
    WAKE.raise();
}

/// Free a sleeper handle.
///
/// # Safety
/// `sleeper` must be null or a handle previously returned by `romi_sleeper_create`.
#[no_mangle]
pub unsafe extern "C" fn romi_sleeper_free(sleeper: RomiSleeperHandle) {
    crate::ffi_boundary((), || {
        if sleeper.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by romi_sleeper_create.
        unsafe {
            drop(Box::from_raw(sleeper as *mut SleeperHandle));
        }
    });
}
