//! Time-weighted gap filling over a completed daily calendar.

use crate::series::error::SeriesError;
use crate::types::observation::{DailyObservation, DailyPrecip};
use crate::types::station::StationSeries;
use log::debug;

/// Fills every missing `total_precip` in a station's calendar.
///
/// Interior gaps are filled linearly in time between the surrounding known values.
/// Gaps before the first or after the last known value take that value unchanged.
/// Non-finite inputs are treated as missing. `precip_type` is dropped.
///
/// # Errors
///
/// * [`SeriesError::NotChronological`] if dates are not strictly ascending.
/// * [`SeriesError::NoObservedValues`] if the station has no finite value at all.
pub fn interpolate_gaps(
    series: &StationSeries<DailyObservation>,
) -> Result<StationSeries<DailyPrecip>, SeriesError> {
    if let Some(pair) = series.records.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(SeriesError::out_of_order_date(series.code(), pair[1].date));
    }

    let known: Vec<(usize, f64)> = series
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.total_precip.filter(|v| v.is_finite()).map(|v| (i, v)))
        .collect();

    let (Some(&(first_idx, first_val)), Some(&(last_idx, last_val))) = (known.first(), known.last())
    else {
        return Err(SeriesError::NoObservedValues {
            station: series.code().to_string(),
        });
    };

    let records = &series.records;
    let mut values: Vec<f64> = Vec::with_capacity(records.len());
    values.extend(std::iter::repeat(first_val).take(first_idx));

    for pair in known.windows(2) {
        let (i1, v1) = pair[0];
        let (i2, v2) = pair[1];
        let t1 = records[i1].date;
        let span = (records[i2].date - t1).num_days() as f64;
        values.push(v1);
        for record in &records[i1 + 1..i2] {
            let elapsed = (record.date - t1).num_days() as f64;
            values.push(v1 + (v2 - v1) * elapsed / span);
        }
    }

    values.push(last_val);
    values.extend(std::iter::repeat(last_val).take(records.len() - last_idx - 1));

    debug!(
        "Station {}: filled {} of {} days",
        series.code(),
        records.len() - known.len(),
        records.len()
    );

    let filled = records
        .iter()
        .zip(values)
        .map(|(record, total_precip)| DailyPrecip {
            date: record.date,
            total_precip,
        })
        .collect();

    Ok(series.derive(filled))
}
