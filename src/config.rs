//! File-based pipeline configuration.

use crate::series::monthly::PartialMonthPolicy;
use crate::spi::transform::DEFAULT_PROBABILITY_EPSILON;
use crate::table::reader::InputLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Window lengths computed when none are configured: one, three and twelve months.
pub const DEFAULT_WINDOWS: [u32; 3] = [1, 3, 12];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// Everything a pipeline run can be configured with.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```json
/// { "windows": [1, 3, 12], "partial_months": "exclude", "min_records": 4380 }
/// ```
///
/// The values are validated when the config is turned into a pipeline with
/// [`crate::SpiPipeline::from_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Rolling window lengths in months, one output table each.
    pub windows: Vec<u32>,
    pub partial_months: PartialMonthPolicy,
    /// Distance kept between cumulative probabilities and 0 or 1 before the probit step.
    pub probability_epsilon: f64,
    /// Stations with fewer raw rows are dropped before processing. The IMGW pipeline
    /// used 40% of thirty years of days, 4380.
    pub min_records: Option<usize>,
    /// When set, only stations whose name is listed are processed.
    pub station_names: Option<Vec<String>>,
    /// Process stations on the rayon thread pool.
    pub parallel: bool,
    /// Layout of input files, for callers that read them through this config.
    pub input_layout: InputLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            partial_months: PartialMonthPolicy::default(),
            probability_epsilon: DEFAULT_PROBABILITY_EPSILON,
            min_records: None,
            station_names: None,
            parallel: false,
            input_layout: InputLayout::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}
