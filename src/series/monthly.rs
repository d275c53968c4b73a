use crate::types::month::Month;
use crate::types::observation::{DailyPrecip, MonthlyTotal};
use crate::types::station::StationSeries;
use serde::{Deserialize, Serialize};

/// What to do with months that are only partly covered by a station's span.
///
/// Only the first and last month of a span can be partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialMonthPolicy {
    /// Sum however many days exist.
    #[default]
    Include,
    /// Drop months with fewer days than the calendar month has.
    Exclude,
}

/// Sums interpolated daily values into one total per calendar month.
///
/// Input must be in ascending date order, as produced by
/// [`crate::series::interpolate::interpolate_gaps`]. Output is chronological.
pub fn aggregate_monthly(
    series: &StationSeries<DailyPrecip>,
    policy: PartialMonthPolicy,
) -> StationSeries<MonthlyTotal> {
    let mut totals: Vec<MonthlyTotal> = Vec::new();
    for day in &series.records {
        let month = Month::from_date(day.date);
        match totals.last_mut() {
            Some(current) if current.month == month => {
                current.total_precip += day.total_precip;
                current.days += 1;
            }
            _ => totals.push(MonthlyTotal {
                month,
                total_precip: day.total_precip,
                days: 1,
            }),
        }
    }

    if policy == PartialMonthPolicy::Exclude {
        totals.retain(|total| total.month.days_in_month() == Some(total.days));
    }

    series.derive(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationInfo;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    /// Daily values from `start` for `days` days, each equal to its day-of-span index * 0.1.
    fn daily(start: NaiveDate, days: usize) -> StationSeries<DailyPrecip> {
        let records = start
            .iter_days()
            .take(days)
            .enumerate()
            .map(|(i, date)| DailyPrecip {
                date,
                total_precip: i as f64 * 0.1,
            })
            .collect();
        StationSeries::new(StationInfo::new("B"), records)
    }

    #[test]
    fn monthly_total_is_sum_of_days() {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let series = daily(start, 59);

        let monthly = aggregate_monthly(&series, PartialMonthPolicy::Include);

        assert_eq!(monthly.len(), 2);
        let january: f64 = series.records[..31].iter().map(|d| d.total_precip).sum();
        let february: f64 = series.records[31..].iter().map(|d| d.total_precip).sum();
        assert_eq!(monthly.records[0].month, Month::new(1, 2019));
        assert_relative_eq!(monthly.records[0].total_precip, january, epsilon = 1e-9);
        assert_eq!(monthly.records[1].days, 28);
        assert_relative_eq!(monthly.records[1].total_precip, february, epsilon = 1e-9);
    }

    #[test]
    fn partial_edge_months_follow_policy() {
        // Jan 20 .. Apr 10 2021: January and April are partial.
        let start = NaiveDate::from_ymd_opt(2021, 1, 20).unwrap();
        let series = daily(start, 81);

        let included = aggregate_monthly(&series, PartialMonthPolicy::Include);
        assert_eq!(included.len(), 4);
        assert_eq!(included.records[0].days, 12);
        assert_eq!(included.records[3].days, 10);

        let excluded = aggregate_monthly(&series, PartialMonthPolicy::Exclude);
        let months: Vec<Month> = excluded.records.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![Month::new(2, 2021), Month::new(3, 2021)]);
    }

    #[test]
    fn year_boundary_starts_a_new_month() {
        let start = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
        let monthly = aggregate_monthly(&daily(start, 2), PartialMonthPolicy::Include);
        assert_eq!(monthly.records[0].month, Month::new(12, 2019));
        assert_eq!(monthly.records[1].month, Month::new(1, 2020));
    }
}
