mod config;
mod error;
mod frame;
mod pipeline;
mod series;
mod spi;
mod table;
mod types;

pub use config::{ConfigError, PipelineConfig, DEFAULT_WINDOWS};
pub use error::SpiError;
pub use frame::SpiLazyFrame;

pub use pipeline::diagnostic::{Diagnostic, DiagnosticKind};
pub use pipeline::report::SpiReport;
pub use pipeline::{SpiPipeline, StationOutcome};

pub use series::calendar::complete_calendar;
pub use series::error::SeriesError;
pub use series::interpolate::interpolate_gaps;
pub use series::monthly::{aggregate_monthly, PartialMonthPolicy};
pub use series::rolling::rolling_sum;

pub use spi::error::FitError;
pub use spi::fit::GammaFit;
pub use spi::transform::{
    ClampedProbability, SpiOutcome, SpiTransformer, DEFAULT_PROBABILITY_EPSILON,
};

pub use table::error::TableError;
pub use table::output::{read_spi_csv, SpiRow, SpiTable};
pub use table::reader::{
    group_by_station, observations_from_frame, read_observations_csv, read_observations_dir,
    InputLayout, ReadOptions,
};

pub use types::month::Month;
pub use types::observation::*;
pub use types::station::{StationInfo, StationSeries};
pub use types::window::WindowLength;
