use romi_transport::TransportError;

/// Errors that can occur during packet encoding, decoding and reading.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The caller's buffer cannot hold even an empty frame.
    #[error("output buffer too small ({capacity} bytes, need more than 4)")]
    BufferTooSmall { capacity: usize },

    /// The advertised frame does not fit in the caller's buffer.
    #[error("frame of {needed} bytes does not fit in a {capacity}-byte buffer")]
    Capacity { needed: usize, capacity: usize },

    /// The payload exceeds what the one-byte length field can express.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame does not start with `0xAA 0x55`.
    #[error("invalid frame header (expected 0xAA 0x55)")]
    InvalidHeader,

    /// Fewer bytes than the frame declares.
    #[error("truncated frame ({len} bytes, expected {expected})")]
    Truncated { len: usize, expected: usize },

    /// A complete in-memory frame failed its integrity check.
    #[error("checksum mismatch (computed {computed:#04x}, received {received:#04x})")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// Too many consecutive frames failed their checksum.
    #[error("gave up after {failures} consecutive checksum failures")]
    ChecksumBudgetExhausted { failures: u32 },

    /// Too many transport errors during a single read.
    #[error("gave up after {errors} transport errors (last: {source})")]
    TransportBudgetExhausted {
        errors: u32,
        #[source]
        source: TransportError,
    },

    /// A transport error while writing.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// A feedback sub-payload could not be parsed.
    #[error("malformed feedback sub-payload {id:#04x}: {reason}")]
    MalformedFeedback { id: u8, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, FrameError>;
