//! The SPI output table: one per window length, exported as CSV.

use crate::frame::SpiLazyFrame;
use crate::table::error::TableError;
use crate::table::reader::read_text_frame;
use crate::table::{MONTH, SPI, STATION_CODE, TOTAL_PRECIP, YEAR};
use crate::types::month::Month;
use crate::types::observation::SpiValue;
use crate::types::station::{StationInfo, StationSeries};
use crate::types::window::WindowLength;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// One flattened row of an [`SpiTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpiRow<'a> {
    pub station_code: &'a str,
    pub month: Month,
    pub total_precip: f64,
    pub spi: f64,
}

/// SPI values for every station that could be fitted, for a single window length.
///
/// Stations appear in ascending code order and each station's rows are chronological,
/// so the table is keyed and sorted by `(station_code, year, month)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiTable {
    window: WindowLength,
    stations: Vec<StationSeries<SpiValue>>,
}

impl SpiTable {
    pub fn new(window: WindowLength, stations: Vec<StationSeries<SpiValue>>) -> Self {
        Self { window, stations }
    }

    pub fn window(&self) -> WindowLength {
        self.window
    }

    pub fn stations(&self) -> &[StationSeries<SpiValue>] {
        &self.stations
    }

    pub fn station(&self, code: &str) -> Option<&StationSeries<SpiValue>> {
        self.stations.iter().find(|s| s.code() == code)
    }

    /// Total number of rows across all stations.
    pub fn len(&self) -> usize {
        self.stations.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = SpiRow<'_>> {
        self.stations.iter().flat_map(|series| {
            series.records.iter().map(move |value| SpiRow {
                station_code: series.code(),
                month: value.month,
                total_precip: value.total_precip,
                spi: value.spi,
            })
        })
    }

    /// Builds a frame with columns `station_code`, `year`, `month`, `total_precip`, `SPI`.
    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let mut codes = Vec::with_capacity(self.len());
        let mut years = Vec::with_capacity(self.len());
        let mut months = Vec::with_capacity(self.len());
        let mut totals = Vec::with_capacity(self.len());
        let mut spis = Vec::with_capacity(self.len());
        for row in self.rows() {
            codes.push(row.station_code.to_string());
            years.push(row.month.year());
            months.push(row.month.month() as i32);
            totals.push(row.total_precip);
            spis.push(row.spi);
        }
        Ok(df!(
            STATION_CODE => codes,
            YEAR => years,
            MONTH => months,
            TOTAL_PRECIP => totals,
            SPI => spis,
        )?)
    }

    /// A lazy view of the table for filtering by station or month range.
    pub fn lazy(&self) -> Result<SpiLazyFrame, TableError> {
        Ok(SpiLazyFrame::new(self.to_dataframe()?.lazy()))
    }

    /// Writes the table as comma-separated text with a header row.
    ///
    /// Floats are written in plain decimal notation at full precision, so
    /// [`read_spi_csv`] restores the same values.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut frame = self.to_dataframe()?;
        let file = File::create(path).map_err(|e| TableError::Io(path.to_path_buf(), e))?;
        CsvWriter::new(file)
            .include_header(true)
            .with_separator(b',')
            .with_float_scientific(Some(false))
            .finish(&mut frame)
            .map_err(|e| TableError::CsvWrite(path.to_path_buf(), e))?;
        info!(
            "Wrote {} SPI rows for window {} to {:?}",
            frame.height(),
            self.window,
            path
        );
        Ok(())
    }
}

/// Reads a table written by [`SpiTable::write_csv`] back into memory.
///
/// Rows of one station must be contiguous, as they are in written tables.
pub fn read_spi_csv(path: &Path, window: WindowLength) -> Result<SpiTable, TableError> {
    let frame = read_text_frame(path, true, b',')?;
    let column = |name: &str| -> Result<StringChunked, TableError> {
        let column = frame.column(name).map_err(|_| TableError::MissingColumn {
            column: name.to_string(),
        })?;
        Ok(column.str()?.clone())
    };
    let codes = column(STATION_CODE)?;
    let years = column(YEAR)?;
    let months = column(MONTH)?;
    let totals = column(TOTAL_PRECIP)?;
    let spis = column(SPI)?;

    let mut stations: Vec<StationSeries<SpiValue>> = Vec::new();
    for row in 0..frame.height() {
        let code = codes.get(row).unwrap_or_default();
        let value = SpiValue {
            month: Month(
                parse_field(&years, YEAR, row)?,
                parse_field(&months, MONTH, row)?,
            ),
            window,
            total_precip: parse_field(&totals, TOTAL_PRECIP, row)?,
            spi: parse_field(&spis, SPI, row)?,
        };
        match stations.last_mut() {
            Some(series) if series.code() == code => series.records.push(value),
            _ => stations.push(StationSeries::new(StationInfo::new(code), vec![value])),
        }
    }
    Ok(SpiTable::new(window, stations))
}

fn parse_field<T: std::str::FromStr>(
    column: &StringChunked,
    name: &str,
    row: usize,
) -> Result<T, TableError> {
    let text = column.get(row).map(str::trim).unwrap_or_default();
    text.parse::<T>().map_err(|_| TableError::InvalidValue {
        column: name.to_string(),
        row,
        message: format!("cannot parse '{}'", text),
    })
}
