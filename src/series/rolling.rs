use crate::series::error::SeriesError;
use crate::types::observation::{MonthlyTotal, RollingWindowValue};
use crate::types::station::StationSeries;
use crate::types::window::WindowLength;
use std::collections::VecDeque;

/// Trailing sum of the `window` most recent monthly totals, current month included.
///
/// Months without a full window of history produce no value at all: the first
/// `window - 1` months of a series are dropped. A missing calendar month restarts the
/// window, so every emitted value covers `window` consecutive months.
///
/// # Errors
///
/// [`SeriesError::NotChronological`] if months are not strictly increasing. The input
/// is never re-sorted.
pub fn rolling_sum(
    series: &StationSeries<MonthlyTotal>,
    window: WindowLength,
) -> Result<StationSeries<RollingWindowValue>, SeriesError> {
    if let Some(pair) = series.records.windows(2).find(|w| w[1].month <= w[0].month) {
        return Err(SeriesError::out_of_order_month(series.code(), pair[1].month));
    }

    let size = window.as_usize();
    let mut buffer: VecDeque<&MonthlyTotal> = VecDeque::with_capacity(size);
    let mut values = Vec::with_capacity(series.len().saturating_sub(size - 1));

    for total in &series.records {
        if buffer
            .back()
            .is_some_and(|previous| previous.month.succ() != total.month)
        {
            buffer.clear();
        }
        if buffer.len() == size {
            buffer.pop_front();
        }
        buffer.push_back(total);

        if buffer.len() == size {
            values.push(RollingWindowValue {
                month: total.month,
                window,
                total_precip: buffer.iter().map(|m| m.total_precip).sum(),
            });
        }
    }

    Ok(series.derive(values))
}
