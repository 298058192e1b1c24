use std::time::Duration;

use romi_transport::{ByteTransport, TransportError};
use tracing::{debug, trace, warn};

use crate::codec::{checksum, Packet, FRAME_OVERHEAD, HEADER, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Retry and timeout settings for [`PacketReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Timeout for each individual transport read. Default: 100 ms.
    pub read_timeout: Duration,
    /// Consecutive checksum failures after which a read gives up. Default: 4.
    pub max_checksum_failures: u32,
    /// Transport errors after which a read gives up. Default: 20.
    pub max_transport_errors: u32,
    /// Flush bytes buffered before the read starts. Default: true.
    pub discard_stale_input: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            max_checksum_failures: 4,
            max_transport_errors: 20,
            discard_stale_input: true,
        }
    }
}

/// Lifetime counters of a [`PacketReader`], across all calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub frames: u64,
    pub checksum_failures: u64,
    pub transport_errors: u64,
    pub skipped_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitHeader,
    ReadLength,
    ReadPayload { len: u8 },
    ReadChecksum { len: u8 },
}

/// Per-call failure counters. Both start at zero on every read.
#[derive(Debug, Default)]
struct Budget {
    checksum_failures: u32,
    transport_errors: u32,
}

/// Reads checksummed frames from a [`ByteTransport`].
///
/// Each call to [`read_packet`](Self::read_packet) runs the
/// WaitHeader → ReadLength → ReadPayload → ReadChecksum machine until a frame
/// validates or one of the two retry budgets runs out. Header search is a
/// sliding two-byte window, so stray bytes of any count are skipped.
pub struct PacketReader<T> {
    inner: T,
    config: ReaderConfig,
    stats: ReaderStats,
}

impl<T: ByteTransport> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            config,
            stats: ReaderStats::default(),
        }
    }

    /// Read the next valid frame into `buf` (blocking).
    ///
    /// On success `buf[..n]` holds the complete frame (header, length,
    /// payload, checksum) and `n` is returned. `buf.len()` is the capacity;
    /// it must exceed [`FRAME_OVERHEAD`].
    pub fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() <= FRAME_OVERHEAD {
            return Err(FrameError::BufferTooSmall {
                capacity: buf.len(),
            });
        }

        let mut budget = Budget::default();
        if self.config.discard_stale_input {
            if let Err(err) = self.inner.discard_input() {
                self.note_transport_error(&mut budget, err)?;
            }
        }

        let timeout = self.config.read_timeout;
        let mut carry = false;
        let mut state = State::WaitHeader;

        loop {
            state = match state {
                State::WaitHeader => match self.sync_header(&mut carry) {
                    Ok(true) => State::ReadLength,
                    Ok(false) => State::WaitHeader,
                    Err(err) => {
                        carry = false;
                        self.note_transport_error(&mut budget, err)?;
                        State::WaitHeader
                    }
                },

                State::ReadLength => {
                    let mut len = [0u8; 1];
                    match self.inner.read_exact_timeout(&mut len, timeout) {
                        Ok(()) => {
                            let len = len[0];
                            let needed = usize::from(len) + FRAME_OVERHEAD;
                            if needed > buf.len() {
                                return Err(FrameError::Capacity {
                                    needed,
                                    capacity: buf.len(),
                                });
                            }
                            buf[..2].copy_from_slice(&HEADER);
                            buf[2] = len;
                            State::ReadPayload { len }
                        }
                        Err(err) => {
                            self.note_transport_error(&mut budget, err)?;
                            State::WaitHeader
                        }
                    }
                }

                State::ReadPayload { len } => {
                    // Payload and trailing checksum in one read.
                    let end = HEADER_SIZE + usize::from(len) + 1;
                    match self
                        .inner
                        .read_exact_timeout(&mut buf[HEADER_SIZE..end], timeout)
                    {
                        Ok(()) => State::ReadChecksum { len },
                        Err(err) => {
                            self.note_transport_error(&mut budget, err)?;
                            State::WaitHeader
                        }
                    }
                }

                State::ReadChecksum { len } => {
                    let body_end = HEADER_SIZE + usize::from(len);
                    let computed = checksum(&buf[2..body_end]);
                    let received = buf[body_end];

                    if computed == received {
                        budget.checksum_failures = 0;
                        self.stats.frames += 1;
                        debug!(len, "frame received");
                        return Ok(body_end + 1);
                    }

                    budget.checksum_failures += 1;
                    self.stats.checksum_failures += 1;
                    warn!(
                        len,
                        computed,
                        received,
                        failures = budget.checksum_failures,
                        "checksum mismatch, resynchronizing"
                    );
                    if budget.checksum_failures >= self.config.max_checksum_failures {
                        return Err(FrameError::ChecksumBudgetExhausted {
                            failures: budget.checksum_failures,
                        });
                    }
                    State::WaitHeader
                }
            };
        }
    }

    /// Read the next valid frame and return a view of it.
    pub fn read<'b>(&mut self, buf: &'b mut [u8]) -> Result<Packet<'b>> {
        let n = self.read_packet(buf)?;
        let frame: &'b [u8] = buf;
        Ok(Packet::from_validated(&frame[..n]))
    }

    /// Advance the header search by one window.
    ///
    /// Returns `Ok(true)` once `0xAA 0x55` has been consumed. `carry` is set
    /// when the last byte seen was `0xAA`, so the next call only needs one byte.
    fn sync_header(&mut self, carry: &mut bool) -> std::result::Result<bool, TransportError> {
        let timeout = self.config.read_timeout;

        if *carry {
            let mut next = [0u8; 1];
            self.inner.read_exact_timeout(&mut next, timeout)?;
            if next[0] == HEADER[1] {
                *carry = false;
                return Ok(true);
            }
            *carry = next[0] == HEADER[0];
            let skipped = if *carry { 1 } else { 2 };
            self.stats.skipped_bytes += skipped;
            trace!(byte = next[0], skipped, "header resync");
            return Ok(false);
        }

        let mut pair = [0u8; 2];
        self.inner.read_exact_timeout(&mut pair, timeout)?;
        if pair == HEADER {
            return Ok(true);
        }
        *carry = pair[1] == HEADER[0];
        let skipped = if *carry { 1 } else { 2 };
        self.stats.skipped_bytes += skipped;
        trace!(?pair, skipped, "skipping non-header bytes");
        Ok(false)
    }

    fn note_transport_error(&mut self, budget: &mut Budget, err: TransportError) -> Result<()> {
        if matches!(err, TransportError::Closed) {
            return Err(FrameError::ConnectionClosed);
        }

        budget.transport_errors += 1;
        self.stats.transport_errors += 1;
        warn!(errors = budget.transport_errors, error = %err, "transport error while reading frame");

        if budget.transport_errors >= self.config.max_transport_errors {
            return Err(FrameError::TransportBudgetExhausted {
                errors: budget.transport_errors,
                source: err,
            });
        }
        Ok(())
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

/// One-shot read of a single frame from `transport` into `buf`.
pub fn read_packet<T: ByteTransport + ?Sized>(
    transport: &mut T,
    buf: &mut [u8],
    config: &ReaderConfig,
) -> Result<usize> {
    PacketReader::with_config(transport, config.clone()).read_packet(buf)
}
