//! The end-to-end run: raw rows in, one SPI table per window out.

pub mod diagnostic;
pub mod report;

use crate::config::{PipelineConfig, DEFAULT_WINDOWS};
use crate::error::SpiError;
use crate::pipeline::diagnostic::{Diagnostic, DiagnosticKind};
use crate::pipeline::report::SpiReport;
use crate::series::calendar::complete_calendar;
use crate::series::error::SeriesError;
use crate::series::interpolate::interpolate_gaps;
use crate::series::monthly::{aggregate_monthly, PartialMonthPolicy};
use crate::series::rolling::rolling_sum;
use crate::spi::transform::{SpiTransformer, DEFAULT_PROBABILITY_EPSILON};
use crate::table::output::SpiTable;
use crate::table::reader::group_by_station;
use crate::types::observation::{DailyObservation, MonthlyTotal, RawObservation, SpiValue};
use crate::types::station::{StationInfo, StationSeries};
use crate::types::window::WindowLength;
use bon::bon;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Computes SPI tables from daily precipitation observations.
///
/// Build one with [`SpiPipeline::builder`] or from a [`PipelineConfig`]. Every station
/// is processed on its own: a station that fails any stage is reported in
/// [`SpiReport::diagnostics`] and left out of the affected tables while the others
/// carry on.
///
/// # Example
///
/// ```
/// use chrono::{Days, NaiveDate};
/// use spi_engine::{RawObservation, SpiPipeline};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
/// let rows: Vec<RawObservation> = (0..365u64)
///     .map(|i| RawObservation::new("250180590", start + Days::new(i), Some((i % 11) as f64)))
///     .collect();
///
/// let pipeline = SpiPipeline::builder().windows(vec![1, 3]).build()?;
/// let report = pipeline.run(rows)?;
///
/// assert_eq!(report.tables().len(), 2);
/// assert_eq!(report.table(1).map(|t| t.len()), Some(12));
/// assert_eq!(report.table(3).map(|t| t.len()), Some(10));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpiPipeline {
    windows: Vec<WindowLength>,
    partial_months: PartialMonthPolicy,
    transformer: SpiTransformer,
    min_records: Option<usize>,
    station_names: Option<BTreeSet<String>>,
    parallel: bool,
}

/// What one station produced: an SPI series for each window that could be fitted.
#[derive(Debug, Clone)]
pub struct StationOutcome {
    pub station: StationInfo,
    pub spi: Vec<(WindowLength, StationSeries<SpiValue>)>,
    pub diagnostics: Vec<Diagnostic>,
}

#[bon]
impl SpiPipeline {
    /// Creates a pipeline.
    ///
    /// # Arguments
    ///
    /// * `windows` - Rolling window lengths in months. Defaults to `[1, 3, 12]`.
    /// * `partial_months` - Whether months not fully covered by observations are kept.
    ///   Defaults to [`PartialMonthPolicy::Include`].
    /// * `probability_epsilon` - Clamping distance for cumulative probabilities, in `(0, 0.5)`.
    ///   Defaults to `1e-6`.
    /// * `min_records` - Drop stations with fewer raw rows than this.
    /// * `station_names` - Only process stations whose name is in this list.
    /// * `parallel` - Process stations on the rayon thread pool. Defaults to `false`.
    ///
    /// # Errors
    ///
    /// [`SpiError::InvalidWindows`] for an empty list, a zero length or a repeated length,
    /// [`SpiError::InvalidEpsilon`] for an epsilon outside `(0, 0.5)`.
    #[builder]
    pub fn new(
        windows: Option<Vec<u32>>,
        partial_months: Option<PartialMonthPolicy>,
        probability_epsilon: Option<f64>,
        min_records: Option<usize>,
        station_names: Option<Vec<String>>,
        parallel: Option<bool>,
    ) -> Result<Self, SpiError> {
        let windows = validate_windows(&windows.unwrap_or_else(|| DEFAULT_WINDOWS.to_vec()))?;
        let epsilon = probability_epsilon.unwrap_or(DEFAULT_PROBABILITY_EPSILON);
        let transformer = SpiTransformer::new(epsilon).ok_or(SpiError::InvalidEpsilon(epsilon))?;

        Ok(Self {
            windows,
            partial_months: partial_months.unwrap_or_default(),
            transformer,
            min_records,
            station_names: station_names.map(|names| names.into_iter().collect()),
            parallel: parallel.unwrap_or(false),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, SpiError> {
        Self::builder()
            .windows(config.windows.clone())
            .partial_months(config.partial_months)
            .probability_epsilon(config.probability_epsilon)
            .maybe_min_records(config.min_records)
            .maybe_station_names(config.station_names.clone())
            .parallel(config.parallel)
            .build()
    }

    pub fn windows(&self) -> &[WindowLength] {
        &self.windows
    }

    /// Groups raw rows by station and runs every selected station through all stages.
    ///
    /// # Errors
    ///
    /// Only structural input problems, such as a station with two rows for one date.
    /// Per-station failures end up in [`SpiReport::diagnostics`].
    pub fn run(&self, rows: Vec<RawObservation>) -> Result<SpiReport, SpiError> {
        let stations = group_by_station(rows)?;
        info!("Grouped input into {} stations", stations.len());
        Ok(self.run_stations(&stations))
    }

    /// Runs already grouped station series. Stations keep their given order in the tables.
    pub fn run_stations(&self, stations: &[StationSeries<DailyObservation>]) -> SpiReport {
        let selected: Vec<&StationSeries<DailyObservation>> =
            stations.iter().filter(|s| self.is_selected(s)).collect();
        if selected.len() < stations.len() {
            info!(
                "Skipping {} of {} stations by name or record count",
                stations.len() - selected.len(),
                stations.len()
            );
        }

        let outcomes: Vec<StationOutcome> = if self.parallel {
            selected
                .par_iter()
                .map(|series| self.process_station(series))
                .collect()
        } else {
            selected
                .iter()
                .map(|series| self.process_station(series))
                .collect()
        };

        self.assemble(outcomes)
    }

    /// Runs one station through calendar completion, interpolation, monthly aggregation,
    /// and then rolling sums and SPI for each window.
    pub fn process_station(&self, series: &StationSeries<DailyObservation>) -> StationOutcome {
        let mut outcome = StationOutcome {
            station: series.station.clone(),
            spi: Vec::with_capacity(self.windows.len()),
            diagnostics: Vec::new(),
        };
        let code = series.code();

        let monthly = match self.monthly_totals(series) {
            Ok(monthly) => monthly,
            Err(e) => {
                outcome
                    .diagnostics
                    .push(Diagnostic::new(code, None, DiagnosticKind::StageFailed(e)));
                return outcome;
            }
        };

        for &window in &self.windows {
            let rolling = match rolling_sum(&monthly, window) {
                Ok(rolling) => rolling,
                Err(e) => {
                    outcome.diagnostics.push(Diagnostic::new(
                        code,
                        Some(window),
                        DiagnosticKind::StageFailed(e),
                    ));
                    continue;
                }
            };
            match self.transformer.transform(&rolling) {
                Ok(spi) => {
                    outcome
                        .diagnostics
                        .extend(spi.clamped.iter().map(|clamp| {
                            Diagnostic::new(
                                code,
                                Some(window),
                                DiagnosticKind::ProbabilityClamped {
                                    month: clamp.month,
                                    probability: clamp.probability,
                                },
                            )
                        }));
                    outcome.spi.push((window, spi.series));
                }
                Err(e) => outcome.diagnostics.push(Diagnostic::new(
                    code,
                    Some(window),
                    DiagnosticKind::DegenerateFit(e),
                )),
            }
        }
        outcome
    }

    fn monthly_totals(
        &self,
        series: &StationSeries<DailyObservation>,
    ) -> Result<StationSeries<MonthlyTotal>, SeriesError> {
        let calendar = complete_calendar(series)?;
        let daily = interpolate_gaps(&calendar)?;
        let monthly = aggregate_monthly(&daily, self.partial_months);
        debug!(
            "Station {}: {} days to {} months",
            series.code(),
            daily.len(),
            monthly.len()
        );
        Ok(monthly)
    }

    fn is_selected(&self, series: &StationSeries<DailyObservation>) -> bool {
        if let Some(names) = &self.station_names {
            let named = series
                .station
                .name
                .as_ref()
                .is_some_and(|name| names.contains(name));
            if !named {
                debug!("Station {} is not in the name list", series.code());
                return false;
            }
        }
        if let Some(min_records) = self.min_records {
            if series.len() < min_records {
                debug!(
                    "Station {} has {} records, fewer than {}",
                    series.code(),
                    series.len(),
                    min_records
                );
                return false;
            }
        }
        true
    }

    fn assemble(&self, outcomes: Vec<StationOutcome>) -> SpiReport {
        let mut per_window: Vec<Vec<StationSeries<SpiValue>>> =
            self.windows.iter().map(|_| Vec::new()).collect();
        let mut diagnostics = Vec::new();

        for outcome in outcomes {
            for diagnostic in &outcome.diagnostics {
                warn!("{}", diagnostic);
            }
            diagnostics.extend(outcome.diagnostics);
            for (window, series) in outcome.spi {
                if let Some(index) = self.windows.iter().position(|w| *w == window) {
                    per_window[index].push(series);
                }
            }
        }

        let tables: Vec<SpiTable> = self
            .windows
            .iter()
            .zip(per_window)
            .map(|(&window, stations)| SpiTable::new(window, stations))
            .collect();
        for table in &tables {
            info!(
                "Window {}: SPI for {} stations, {} rows",
                table.window(),
                table.stations().len(),
                table.len()
            );
        }
        SpiReport {
            tables,
            diagnostics,
        }
    }
}

fn validate_windows(windows: &[u32]) -> Result<Vec<WindowLength>, SpiError> {
    if windows.is_empty() {
        return Err(SpiError::InvalidWindows(
            "at least one window length is required".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    windows
        .iter()
        .map(|&months| {
            let window = WindowLength::new(months).ok_or_else(|| {
                SpiError::InvalidWindows("window lengths must be positive, got 0".to_string())
            })?;
            if !seen.insert(window) {
                return Err(SpiError::InvalidWindows(format!(
                    "window {} is listed more than once",
                    window
                )));
            }
            Ok(window)
        })
        .collect()
}
