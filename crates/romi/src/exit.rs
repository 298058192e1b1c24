use std::fmt;
use std::io;

use romi_clock::{ClockError, SleepError};
use romi_frame::FrameError;
use romi_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::TransportBudgetExhausted { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        FrameError::PayloadTooLarge { .. }
        | FrameError::InvalidHeader
        | FrameError::Truncated { .. }
        | FrameError::ChecksumMismatch { .. }
        | FrameError::ChecksumBudgetExhausted { .. }
        | FrameError::MalformedFeedback { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn clock_error(context: &str, err: ClockError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn sleep_error(context: &str, err: SleepError) -> CliError {
    match err {
        SleepError::Interrupted => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_map_to_exit_codes() {
        assert_eq!(
            frame_error("x", FrameError::ChecksumBudgetExhausted { failures: 4 }).code,
            DATA_INVALID
        );
        assert_eq!(
            frame_error(
                "x",
                FrameError::TransportBudgetExhausted {
                    errors: 20,
                    source: TransportError::Timeout {
                        expected: 1,
                        received: 0
                    },
                }
            )
            .code,
            TRANSPORT_ERROR
        );
        assert_eq!(frame_error("x", FrameError::ConnectionClosed).code, FAILURE);
        assert_eq!(
            frame_error("x", FrameError::Capacity { needed: 9, capacity: 8 }).code,
            INTERNAL
        );
    }

    #[test]
    fn transport_errors_unwrap_io_kinds() {
        let err = TransportError::Open {
            path: "/dev/ttyUSB9".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let cli = transport_error("open failed", err);
        assert_eq!(cli.code, PERMISSION_DENIED);
        assert!(cli.message.starts_with("open failed: "));

        let wrapped = FrameError::Transport(TransportError::Timeout {
            expected: 4,
            received: 1,
        });
        assert_eq!(frame_error("send failed", wrapped).code, TIMEOUT);
    }
}
