use chrono::NaiveDate;
use thiserror::Error;

use crate::types::month::Month;

/// A per-station failure in one of the series stages.
///
/// These never abort a batch: the pipeline records them against the station and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("Station '{station}' has no observations")]
    Empty { station: String },

    #[error("Station '{station}' has more than one observation for {date}")]
    DuplicateDate { station: String, date: NaiveDate },

    #[error("Records for station '{station}' are not in chronological order at {at}")]
    NotChronological { station: String, at: String },

    #[error("Station '{station}' has no observed precipitation value to interpolate from")]
    NoObservedValues { station: String },
}

impl SeriesError {
    pub(crate) fn out_of_order_date(station: &str, date: NaiveDate) -> Self {
        SeriesError::NotChronological {
            station: station.to_string(),
            at: date.to_string(),
        }
    }

    pub(crate) fn out_of_order_month(station: &str, month: Month) -> Self {
        SeriesError::NotChronological {
            station: station.to_string(),
            at: month.to_string(),
        }
    }
}
