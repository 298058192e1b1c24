use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// Adapts any `Read + Write` stream to [`ByteTransport`].
///
/// The timeout is enforced between reads: a stream that blocks forever inside
/// `read` cannot be interrupted from here. Streams that return `WouldBlock` or
/// `TimedOut` (non-blocking sockets, sockets with a read timeout) are polled
/// until the deadline passes.
pub struct IoTransport<T> {
    inner: T,
}

impl<T: Read + Write> IoTransport<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> ByteTransport for IoTransport<T> {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        read_exact_deadline(&mut self.inner, buf, timeout)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        write_all_retrying(&mut self.inner, buf)
    }
}

impl<T> std::fmt::Debug for IoTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoTransport").finish_non_exhaustive()
    }
}

/// Fill `buf` from `reader`, giving up once `timeout` has elapsed.
///
/// `Ok(0)` from the reader means end-of-stream. Readers that time out per call
/// must report it as `WouldBlock` or `TimedOut`.
pub(crate) fn read_exact_deadline<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now().checked_add(timeout);
    let mut filled = 0usize;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                std::thread::yield_now();
            }
            Err(err) => return Err(TransportError::Io(err)),
        }

        if filled < buf.len() && deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(TransportError::Timeout {
                expected: buf.len(),
                received: filled,
            });
        }
    }

    Ok(())
}

pub(crate) fn write_all_retrying<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match writer.write(&buf[offset..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    loop {
        match writer.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const T: Duration = Duration::from_millis(50);

    #[test]
    fn reads_exact_count() {
        let mut transport = IoTransport::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut buf = [0u8; 3];

        transport.read_exact_timeout(&mut buf, T).unwrap();
        assert_eq!(buf, [1, 2, 3]);

        let mut rest = [0u8; 2];
        transport.read_exact_timeout(&mut rest, T).unwrap();
        assert_eq!(rest, [4, 5]);
    }

    #[test]
    fn eof_mid_read_is_closed() {
        let mut transport = IoTransport::new(Cursor::new(vec![1u8, 2]));
        let mut buf = [0u8; 4];

        let err = transport.read_exact_timeout(&mut buf, T).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert!(!err.is_transient());
    }

    #[test]
    fn empty_read_succeeds_immediately() {
        let mut transport = IoTransport::new(Cursor::new(Vec::<u8>::new()));
        transport.read_exact_timeout(&mut [], T).unwrap();
    }

    #[test]
    fn would_block_times_out_with_partial_count() {
        let mut transport = IoTransport::new(Trickle {
            bytes: vec![0xAA],
            pos: 0,
        });
        let mut buf = [0u8; 2];

        let err = transport
            .read_exact_timeout(&mut buf, Duration::from_millis(5))
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Timeout {
                expected: 2,
                received: 1
            }
        ));
        assert!(err.is_transient());
    }

    #[test]
    fn interrupted_read_retries() {
        let mut transport = IoTransport::new(InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(vec![7u8, 8]),
        });
        let mut buf = [0u8; 2];

        transport.read_exact_timeout(&mut buf, T).unwrap();
        assert_eq!(buf, [7, 8]);
    }

    #[test]
    fn write_all_reaches_stream() {
        let mut transport = IoTransport::new(Cursor::new(Vec::<u8>::new()));
        transport.write_all(&[0xAA, 0x55, 0x00, 0x00]).unwrap();

        assert_eq!(
            transport.into_inner().into_inner(),
            vec![0xAA, 0x55, 0x00, 0x00]
        );
    }

    #[test]
    fn zero_length_write_is_closed() {
        let mut transport = IoTransport::new(ZeroWriter);
        let err = transport.write_all(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Read for ZeroWriter {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
