//! Station identity and the per-station series container that every stage
//! consumes and produces.

use serde::{Deserialize, Serialize};

/// Identity of a precipitation station.
///
/// Only `code` is ever computed from. The descriptive fields are carried through the
/// pipeline exactly as they were read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationInfo {
    /// The station code, unique per station (e.g. "249180010").
    pub code: String,
    /// Human readable station name, if the input carried one.
    pub name: Option<String>,
    /// Latitude as it appeared in the input.
    pub latitude: Option<String>,
    /// Longitude as it appeared in the input.
    pub longitude: Option<String>,
}

impl StationInfo {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the station name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One station's records for a single pipeline stage, in the order that stage defines.
///
/// Stages never edit a series in place: each returns a new `StationSeries` with a
/// different record type.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries<T> {
    pub station: StationInfo,
    pub records: Vec<T>,
}

impl<T> StationSeries<T> {
    pub fn new(station: StationInfo, records: Vec<T>) -> Self {
        Self { station, records }
    }

    pub fn code(&self) -> &str {
        &self.station.code
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the next stage's series for the same station.
    pub(crate) fn derive<U>(&self, records: Vec<U>) -> StationSeries<U> {
        StationSeries {
            station: self.station.clone(),
            records,
        }
    }
}
