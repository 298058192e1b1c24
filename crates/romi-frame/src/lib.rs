//! Checksummed packet framing for the Romi serial protocol.
//!
//! This is the core value-add layer of romi. Every packet is framed with:
//! - A 2-byte header `0xAA 0x55` for stream synchronization
//! - A 1-byte payload length
//! - The payload
//! - A 1-byte XOR checksum over the length and payload
//!
//! [`PacketReader`] pulls validated frames out of a noisy byte stream with
//! bounded retry; [`PacketWriter`] sends them. [`DriveCommand`] and
//! [`SensorFeedback`] give the robot-level meaning of the payloads.

pub mod codec;
pub mod command;
pub mod error;
pub mod feedback;
pub mod reader;
pub mod writer;

pub use codec::{
    checksum, decode_packet, encode_packet, Packet, FRAME_OVERHEAD, HEADER, HEADER_SIZE,
    MAX_FRAME_SIZE, MAX_PAYLOAD,
};
pub use command::DriveCommand;
pub use error::{FrameError, Result};
pub use feedback::{
    Bumps, Buttons, ChargerState, ControllerGain, DockingIr, GeneralInput, GyroRate,
    SensorFeedback, Version,
};
pub use reader::{read_packet, PacketReader, ReaderConfig, ReaderStats};
pub use writer::PacketWriter;
