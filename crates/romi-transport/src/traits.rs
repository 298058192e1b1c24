use std::time::Duration;

use crate::error::Result;

/// A blocking byte transport, typically a UART.
///
/// Implementations must either fill `buf` completely or fail; a partial read
/// is reported as [`TransportError::Timeout`](crate::TransportError::Timeout)
/// with the number of bytes that did arrive. Bytes received before a timeout
/// are consumed and lost.
pub trait ByteTransport {
    /// Read exactly `buf.len()` bytes, waiting at most `timeout` in total.
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()>;

    /// Write all of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Drop any bytes that were buffered before this call.
    ///
    /// The default does nothing, which is correct for transports without an
    /// input queue.
    fn discard_input(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        (**self).read_exact_timeout(buf, timeout)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        (**self).read_exact_timeout(buf, timeout)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }
}
