//! Contains the `SpiLazyFrame` structure for lazy filtering of SPI output tables.

use crate::table::{MONTH, SPI, STATION_CODE, YEAR};
use crate::types::month::Month;
use polars::prelude::{col, lit, Expr, LazyFrame};

/// A wrapper around a Polars `LazyFrame` holding an SPI table.
///
/// The frame has the columns `station_code`, `year`, `month`, `total_precip` and `SPI`,
/// as produced by [`crate::SpiTable::to_dataframe`]. Every method returns a *new*
/// `SpiLazyFrame`; nothing is computed until `.frame.collect()` is called.
///
/// Instances are typically obtained via [`crate::SpiTable::lazy`].
///
/// # Errors
///
/// Operations that trigger computation on the underlying `LazyFrame` (e.g. `.collect()`)
/// can return a [`polars::prelude::PolarsError`].
///
/// # Example
///
/// ```
/// use chrono::{Days, NaiveDate};
/// use spi_engine::{Month, RawObservation, SpiPipeline};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let rows: Vec<RawObservation> = (0..730u64)
///     .map(|i| RawObservation::new("A", start + Days::new(i), Some((i % 17) as f64)))
///     .collect();
///
/// let report = SpiPipeline::builder().windows(vec![3]).build()?.run(rows)?;
/// let summer = report.tables()[0]
///     .lazy()?
///     .get_range(Month::new(6, 2020), Month::new(8, 2020));
///
/// let df = summer.frame.collect()?;
/// assert_eq!(df.height(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SpiLazyFrame {
    /// The underlying Polars LazyFrame containing the SPI rows.
    pub frame: LazyFrame,
}

impl SpiLazyFrame {
    /// Creates a new `SpiLazyFrame` wrapping the given Polars `LazyFrame`.
    ///
    /// # Arguments
    ///
    /// * `frame` - A `LazyFrame` assumed to have the SPI table schema.
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Filters the rows with an arbitrary Polars predicate.
    ///
    /// # Arguments
    ///
    /// * `predicate` - A Polars [`Expr`] defining the filtering condition, for example
    ///   `col("SPI").lt_eq(lit(-1.5))` for severely dry months.
    pub fn filter(&self, predicate: Expr) -> SpiLazyFrame {
        SpiLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Keeps only the rows of one station.
    pub fn station(&self, code: &str) -> SpiLazyFrame {
        self.filter(col(STATION_CODE).eq(lit(code)))
    }

    /// Keeps the rows from `start` to `end`, both inclusive. Ranges may cross year boundaries.
    pub fn get_range(&self, start: Month, end: Month) -> SpiLazyFrame {
        // (year > start_year) OR (year == start_year AND month >= start_month)
        let after_start = col(YEAR).gt(lit(start.year())).or(col(YEAR)
            .eq(lit(start.year()))
            .and(col(MONTH).gt_eq(lit(start.month() as i32))));

        // (year < end_year) OR (year == end_year AND month <= end_month)
        let before_end = col(YEAR).lt(lit(end.year())).or(col(YEAR)
            .eq(lit(end.year()))
            .and(col(MONTH).lt_eq(lit(end.month() as i32))));

        self.filter(after_start.and(before_end))
    }

    /// Keeps the rows of a single month. Collecting yields at most one row per station.
    pub fn get_at(&self, month: Month) -> SpiLazyFrame {
        self.filter(
            col(YEAR)
                .eq(lit(month.year()))
                .and(col(MONTH).eq(lit(month.month() as i32))),
        )
    }

    /// Keeps rows whose SPI is at or below `threshold`.
    pub fn at_or_below(&self, threshold: f64) -> SpiLazyFrame {
        self.filter(col(SPI).lt_eq(lit(threshold)))
    }
}
