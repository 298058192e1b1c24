use std::path::PathBuf;

/// Errors that can occur in byte transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device at the specified path.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The device rejected or does not support the requested configuration.
    #[error("unsupported serial configuration: {0}")]
    Config(String),

    /// Fewer bytes than requested arrived before the deadline.
    #[error("read timed out ({received} of {expected} bytes received)")]
    Timeout { expected: usize, received: usize },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end-of-file.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Closed | TransportError::Open { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
