/// Core error types for tonechain
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for tonechain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Equalizer band index outside the fixed band range
    #[error("Equalizer band {index} out of range (0..{bands})")]
    BandOutOfRange {
        /// Requested band index
        index: usize,
        /// Number of bands available
        bands: usize,
    },

    /// Filter name that does not match any known filter kind
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Control-surface index that maps to no enum value
    #[error("Invalid {field} index: {index}")]
    InvalidIndex {
        /// Field the index was meant for
        field: &'static str,
        /// Offending index
        index: u32,
    },
}
