use thiserror::Error;

/// Error taxonomy for the recommendation core.
///
/// Degraded-data conditions (no neighbors, empty history) are not errors and
/// never appear here; engines fall back to the trending signal instead. Only
/// malformed input rejected at the boundary and store-level failures surface
/// as `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown interaction type: {0}")]
    UnknownInteractionType(String),

    #[error("unknown recommendation strategy: {0}")]
    UnknownStrategy(String),

    #[error("unknown similarity mode: {0}")]
    UnknownSimilarityMode(String),

    #[error("invalid limit: {0} (must be between 1 and 1000)")]
    InvalidLimit(usize),

    #[error("invalid rating value: {0} (must be between 1.0 and 5.0)")]
    InvalidRatingValue(f64),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// True for errors the caller created; maps to a 4xx at the HTTP boundary.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Error::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
