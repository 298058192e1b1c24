//! Rust-side adapters over C callbacks.

use std::ffi::c_void;
use std::io::ErrorKind;
use std::time::Duration;

use romi_clock::{HardwareCounter, InterruptControl};
use romi_transport::{ByteTransport, TransportError};

type ReadFn = unsafe extern "C" fn(*mut c_void, *mut u8, usize, u32) -> isize;
type CounterFn = unsafe extern "C" fn(*mut c_void) -> u32;
type IrqFn = unsafe extern "C" fn(*mut c_void, u8);
type PriorityFn = unsafe extern "C" fn(*mut c_void, u8, u8);

/// Read-only transport backed by a C read callback.
pub(crate) struct CallbackTransport {
    read: ReadFn,
    ctx: *mut c_void,
}

impl CallbackTransport {
    pub(crate) fn new(read: ReadFn, ctx: *mut c_void) -> Self {
        Self { read, ctx }
    }
}

impl ByteTransport for CallbackTransport {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> romi_transport::Result<()> {
        let timeout_us = u32::try_from(timeout.as_micros()).unwrap_or(u32::MAX);
        // SAFETY: the caller of romi_read_packet guarantees the callback and
        // context are valid; `buf` is writable for `buf.len()` bytes.
        let n = unsafe { (self.read)(self.ctx, buf.as_mut_ptr(), buf.len(), timeout_us) };
        match usize::try_from(n) {
            Err(_) => Err(TransportError::Closed),
            Ok(n) if n >= buf.len() => Ok(()),
            Ok(received) => Err(TransportError::Timeout {
                expected: buf.len(),
                received,
            }),
        }
    }

    fn write_all(&mut self, _buf: &[u8]) -> romi_transport::Result<()> {
        Err(TransportError::Io(ErrorKind::Unsupported.into()))
    }
}

/// Hardware timer owned by C code; `start` is a no-op because the C side
/// starts its timer before creating the clock.
pub(crate) struct CallbackCounter {
    read: CounterFn,
    ctx: *mut c_void,
    tick_hz: u32,
    has_overflow_irq: bool,
}

impl CallbackCounter {
    pub(crate) fn new(read: CounterFn, ctx: *mut c_void, tick_hz: u32, has_overflow_irq: bool) -> Self {
        Self {
            read,
            ctx,
            tick_hz,
            has_overflow_irq,
        }
    }
}

impl HardwareCounter for CallbackCounter {
    fn start(&mut self) {}

    fn read_raw(&self) -> u32 {
        // SAFETY: validity of the callback and context is guaranteed by the
        // caller of romi_clock_create for the lifetime of the clock.
        unsafe { (self.read)(self.ctx) }
    }

    fn arm_overflow_notify(&mut self) -> bool {
        self.has_overflow_irq
    }

    fn tick_hz(&self) -> u32 {
        self.tick_hz
    }
}

/// Interrupt controller driven through C callbacks.
pub(crate) struct CallbackInterrupts {
    pub(crate) enable: IrqFn,
    pub(crate) disable: IrqFn,
    pub(crate) set_priority: PriorityFn,
    pub(crate) ctx: *mut c_void,
}

impl InterruptControl for CallbackInterrupts {
    fn enable(&mut self, irq: u8) {
        // SAFETY: guaranteed valid by the caller of romi_sleeper_create.
        unsafe { (self.enable)(self.ctx, irq) }
    }

    fn disable(&mut self, irq: u8) {
        // SAFETY: as above.
        unsafe { (self.disable)(self.ctx, irq) }
    }

    fn set_priority(&mut self, irq: u8, priority: u8) {
        // SAFETY: as above.
        unsafe { (self.set_priority)(self.ctx, irq, priority) }
    }
}
