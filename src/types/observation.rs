//! Record types flowing between the pipeline stages.

use crate::types::month::Month;
use crate::types::window::WindowLength;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the input table, before it is grouped by station.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawObservation {
    pub station_code: String,
    pub date: NaiveDate,
    /// `None` when the value is missing or unparseable.
    pub total_precip: Option<f64>,
    pub precip_type: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl RawObservation {
    pub fn new(station_code: impl Into<String>, date: NaiveDate, total_precip: Option<f64>) -> Self {
        Self {
            station_code: station_code.into(),
            date,
            total_precip,
            ..Default::default()
        }
    }
}

/// A daily observation for a single station. After calendar completion there is
/// exactly one per day of the station's span.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub total_precip: Option<f64>,
    pub precip_type: Option<String>,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, total_precip: Option<f64>) -> Self {
        Self {
            date,
            total_precip,
            precip_type: None,
        }
    }

    pub(crate) fn missing(date: NaiveDate) -> Self {
        Self::new(date, None)
    }
}

/// A daily value after gap filling. Always finite.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrecip {
    pub date: NaiveDate,
    pub total_precip: f64,
}

/// Precipitation summed over one calendar month.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: Month,
    pub total_precip: f64,
    /// How many days of the station's span fell in this month.
    pub days: u32,
}

/// Trailing sum of `window` consecutive monthly totals ending at `month`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingWindowValue {
    pub month: Month,
    pub window: WindowLength,
    pub total_precip: f64,
}

/// Standardized precipitation index for one rolling value.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiValue {
    pub month: Month,
    pub window: WindowLength,
    pub total_precip: f64,
    pub spi: f64,
}
