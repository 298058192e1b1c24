use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Header bytes that open every frame.
pub const HEADER: [u8; 2] = [0xAA, 0x55];

/// Header plus length byte.
pub const HEADER_SIZE: usize = 3;

/// Bytes a frame carries besides its payload: header (2), length (1), checksum (1).
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 1;

/// Largest payload the length byte can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Largest frame the robot firmware sends in practice.
pub const MAX_FRAME_SIZE: usize = 140;

/// XOR of all bytes in `bytes`.
///
/// On the wire this covers the length byte and the payload, never the header.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// A validated frame borrowed from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    payload: &'a [u8],
    checksum: u8,
}

impl<'a> Packet<'a> {
    /// View a frame that has already been validated.
    pub(crate) fn from_validated(frame: &'a [u8]) -> Self {
        let end = frame.len() - 1;
        Self {
            payload: &frame[HEADER_SIZE..end],
            checksum: frame[end],
        }
    }

    /// The payload bytes.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// The trailing checksum byte.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// The total wire size of this frame (overhead + payload).
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬─────────────┬──────────┐
/// │ Header    │ Length   │ Payload     │ Checksum │
/// │ 0xAA 0x55 │ (1B)     │ (L bytes)   │ (1B XOR) │
/// └───────────┴──────────┴─────────────┴──────────┘
///               └──── XOR covers these ───┘
/// ```
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let len = payload.len() as u8;

    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_slice(&HEADER);
    dst.put_u8(len);
    dst.put_slice(payload);
    dst.put_u8(len ^ checksum(payload));
    Ok(())
}

/// Validate one complete frame at the start of `src`.
///
/// Bytes after the frame are ignored.
pub fn decode_packet(src: &[u8]) -> Result<Packet<'_>> {
    if src.len() < FRAME_OVERHEAD {
        return Err(FrameError::Truncated {
            len: src.len(),
            expected: FRAME_OVERHEAD,
        });
    }
    if src[..2] != HEADER {
        return Err(FrameError::InvalidHeader);
    }

    let total = usize::from(src[2]) + FRAME_OVERHEAD;
    if src.len() < total {
        return Err(FrameError::Truncated {
            len: src.len(),
            expected: total,
        });
    }

    let computed = checksum(&src[2..total - 1]);
    let received = src[total - 1];
    if computed != received {
        return Err(FrameError::ChecksumMismatch { computed, received });
    }

    Ok(Packet::from_validated(&src[..total]))
}
