use crate::config::ConfigError;
use crate::table::error::TableError;
use thiserror::Error;

/// Errors that stop a whole run. Per-station problems are diagnostics instead.
#[derive(Debug, Error)]
pub enum SpiError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid window lengths: {0}")]
    InvalidWindows(String),

    #[error("Probability epsilon must be in (0, 0.5), got {0}")]
    InvalidEpsilon(f64),
}
