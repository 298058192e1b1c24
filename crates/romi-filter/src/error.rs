/// Errors from delay line construction and access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("delay line capacity must be at least 1")]
    ZeroCapacity,

    /// Lags are 0-based: lag 0 is the newest sample.
    #[error("lag {lag} out of range for delay line of capacity {capacity}")]
    LagOutOfRange { lag: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, FilterError>;
