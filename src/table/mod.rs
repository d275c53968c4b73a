//! Tabular input and output: CSV readers for raw observations, the SPI output table
//! and its CSV export.

pub mod error;
pub mod output;
pub mod reader;

pub const STATION_CODE: &str = "station_code";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const TOTAL_PRECIP: &str = "total_precip";
pub const SPI: &str = "SPI";
