//! Calendar completion: turns a station's scattered observations into one record per
//! day between its first and last observed date.

use crate::series::error::SeriesError;
use crate::types::observation::DailyObservation;
use crate::types::station::StationSeries;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Builds the complete daily calendar for one station.
///
/// The result holds exactly one record for every day in `[min_date, max_date]`, in
/// ascending order. Days without an original observation come out with
/// `total_precip: None`.
///
/// # Errors
///
/// * [`SeriesError::Empty`] if the station has no observations at all.
/// * [`SeriesError::DuplicateDate`] if two observations share a date.
pub fn complete_calendar(
    series: &StationSeries<DailyObservation>,
) -> Result<StationSeries<DailyObservation>, SeriesError> {
    let mut by_date: BTreeMap<NaiveDate, &DailyObservation> = BTreeMap::new();
    for observation in &series.records {
        if by_date.insert(observation.date, observation).is_some() {
            return Err(SeriesError::DuplicateDate {
                station: series.code().to_string(),
                date: observation.date,
            });
        }
    }

    let (Some((&min_date, _)), Some((&max_date, _))) =
        (by_date.first_key_value(), by_date.last_key_value())
    else {
        return Err(SeriesError::Empty {
            station: series.code().to_string(),
        });
    };

    let records: Vec<DailyObservation> = min_date
        .iter_days()
        .take_while(|date| *date <= max_date)
        .map(|date| match by_date.get(&date) {
            Some(observation) => (*observation).clone(),
            None => DailyObservation::missing(date),
        })
        .collect();

    debug!(
        "Station {}: calendar {}..={} has {} days, {} observed",
        series.code(),
        min_date,
        max_date,
        records.len(),
        by_date.len()
    );

    Ok(series.derive(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationInfo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(records: Vec<DailyObservation>) -> StationSeries<DailyObservation> {
        StationSeries::new(StationInfo::new("250190390"), records)
    }

    #[test]
    fn fills_every_day_of_the_span() -> Result<(), SeriesError> {
        let input = series(vec![
            DailyObservation::new(date(2020, 3, 5), Some(1.0)),
            DailyObservation::new(date(2020, 2, 25), Some(2.5)),
            DailyObservation::new(date(2020, 3, 1), None),
        ]);

        let completed = complete_calendar(&input)?;

        // 2020 is a leap year: Feb 25..=Mar 5 is 10 days.
        let expected_days = (date(2020, 3, 5) - date(2020, 2, 25)).num_days() + 1;
        assert_eq!(completed.len() as i64, expected_days);
        assert_eq!(completed.records[0].date, date(2020, 2, 25));
        assert_eq!(completed.records[0].total_precip, Some(2.5));
        assert_eq!(completed.records.last().unwrap().total_precip, Some(1.0));

        let dates: Vec<NaiveDate> = completed.records.iter().map(|r| r.date).collect();
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 1));

        let missing = completed
            .records
            .iter()
            .filter(|r| r.total_precip.is_none())
            .count();
        assert_eq!(missing, 8);
        Ok(())
    }

    #[test]
    fn keeps_precip_type_of_original_rows() -> Result<(), SeriesError> {
        let mut observed = DailyObservation::new(date(2001, 1, 1), Some(0.4));
        observed.precip_type = Some("W".to_string());
        let input = series(vec![observed, DailyObservation::new(date(2001, 1, 3), Some(0.0))]);

        let completed = complete_calendar(&input)?;

        assert_eq!(completed.records[0].precip_type.as_deref(), Some("W"));
        assert_eq!(completed.records[1].precip_type, None);
        assert_eq!(completed.station.code, "250190390");
        Ok(())
    }

    #[test]
    fn single_observation_gives_single_day() -> Result<(), SeriesError> {
        let input = series(vec![DailyObservation::new(date(2010, 6, 1), Some(3.0))]);
        let completed = complete_calendar(&input)?;
        assert_eq!(completed.len(), 1);
        Ok(())
    }

    #[test]
    fn rejects_duplicate_dates() {
        let input = series(vec![
            DailyObservation::new(date(2010, 6, 1), Some(3.0)),
            DailyObservation::new(date(2010, 6, 1), Some(4.0)),
        ]);
        assert!(matches!(
            complete_calendar(&input),
            Err(SeriesError::DuplicateDate { .. })
        ));
    }

    #[test]
    fn rejects_empty_station() {
        assert!(matches!(
            complete_calendar(&series(vec![])),
            Err(SeriesError::Empty { .. })
        ));
    }
}
