//! Byte transport abstraction for the Romi serial link.
//!
//! Everything above this crate talks to the robot through [`ByteTransport`]:
//! a blocking "read exactly K bytes within T" primitive plus a write.
//!
//! - [`IoTransport`] adapts any `Read + Write` stream (files, sockets, cursors)
//! - [`SerialPort`] opens a POSIX tty in raw mode (Unix only)
//!
//! This is the lowest layer of romi. The UART registers, DMA and the like
//! live below it and are not modelled here.

pub mod error;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use stream::IoTransport;
pub use traits::ByteTransport;

#[cfg(unix)]
pub use serial::{SerialConfig, SerialPort};
