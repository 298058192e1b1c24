use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::{read_exact_deadline, write_all_retrying};
use crate::traits::ByteTransport;

/// Line settings for a [`SerialPort`]. Always 8 data bits, no parity, 1 stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate. Default: 115200, the rate the Romi firmware listens on.
    pub baud_rate: u32,
    /// How long a single `read(2)` may block before returning to the deadline
    /// check. Rounded to deciseconds, clamped to 0.1 s ..= 25.5 s.
    pub read_poll: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_poll: Duration::from_millis(100),
        }
    }
}

/// A POSIX tty opened in raw mode.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    config: SerialConfig,
}

impl SerialPort {
    /// Open and configure the serial device at `path`.
    pub fn open(path: impl AsRef<Path>, config: SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_constant(config.baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        configure_raw(&file, speed, config.read_poll)?;
        info!(?path, baud = config.baud_rate, "opened serial port");

        Ok(Self { file, path, config })
    }

    /// The device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line settings applied at open.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        // With VMIN=0 a zero-length read means VTIME expired, not EOF.
        match self.file.read(buf)? {
            0 if !buf.is_empty() => Err(std::io::Error::from(ErrorKind::TimedOut)),
            n => Ok(n),
        }
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl ByteTransport for SerialPort {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        read_exact_deadline(self, buf, timeout)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        write_all_retrying(self, buf)
    }

    fn discard_input(&mut self) -> Result<()> {
        // SAFETY: the descriptor is owned by `self.file` and open for the call.
        let rc = unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIFLUSH) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        debug!(path = ?self.path, "discarded stale serial input");
        Ok(())
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.config.baud_rate)
            .finish()
    }
}

fn configure_raw(file: &File, speed: libc::speed_t, read_poll: Duration) -> Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: termios is a plain C struct; all-zero is a valid bit pattern and
    // it is fully overwritten by tcgetattr below.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor and `tio` is a valid writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    // SAFETY: `tio` is a valid termios obtained from tcgetattr.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_cflag &= !(libc::PARENB | libc::CSTOPB | libc::CSIZE);
    tio.c_cflag |= libc::CS8;
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = poll_deciseconds(read_poll);

    // SAFETY: `tio` is valid and `speed` is one of the libc B* constants.
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    // SAFETY: as above.
    if unsafe { libc::cfsetospeed(&mut tio, speed) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    // SAFETY: `fd` is open and `tio` is a fully initialised termios.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(())
}

fn poll_deciseconds(poll: Duration) -> libc::cc_t {
    let ds = poll.as_millis().div_ceil(100).clamp(1, 255);
    ds as libc::cc_t
}

fn baud_constant(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        other => {
            return Err(TransportError::Config(format!(
                "baud rate {other} is not supported"
            )))
        }
    };
    Ok(speed)
}
