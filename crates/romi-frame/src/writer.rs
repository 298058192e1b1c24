use bytes::BytesMut;
use romi_transport::{ByteTransport, TransportError};
use tracing::debug;

use crate::codec::{encode_packet, MAX_FRAME_SIZE};
use crate::command::DriveCommand;
use crate::error::{FrameError, Result};

/// Writes complete frames to a [`ByteTransport`].
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: ByteTransport> PacketWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Frame `payload` and send it (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_packet(payload, &mut self.buf)?;
        self.write_packet()?;
        debug!(len = payload.len(), "frame sent");
        Ok(())
    }

    /// Encode and send a drive command.
    pub fn send_drive(&mut self, command: DriveCommand) -> Result<()> {
        self.send(&command.to_payload())
    }

    fn write_packet(&mut self) -> Result<()> {
        match self.inner.write_all(&self.buf) {
            Ok(()) => Ok(()),
            Err(TransportError::Closed) => Err(FrameError::ConnectionClosed),
            Err(err) => Err(FrameError::Transport(err)),
        }
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
