use thiserror::Error;

/// Why a gamma distribution could not be fitted to a rolling-sum series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("Cannot fit a distribution to an empty series")]
    Empty,

    #[error("Series contains a non-finite value ({0})")]
    NonFinite(f64),

    #[error("Series contains a negative precipitation sum ({0})")]
    Negative(f64),

    #[error("Degenerate series: {distinct} distinct positive value(s) out of {len}, at least 2 are needed")]
    Degenerate { distinct: usize, len: usize },

    #[error("Series varies too little to fit a gamma distribution (coefficient of variation {variation:e})")]
    IllConditioned { variation: f64 },

    #[error("Failed to construct distribution: {0}")]
    Distribution(String),
}
