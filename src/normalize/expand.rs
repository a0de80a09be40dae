use super::NormalizeError;
use crate::data_io::GriddedField;
use crate::time_utils::{floor_day, regular_axis};
use chrono::Duration;
use ndarray::{Array3, Axis};

/// Output step of the expanded series
pub const SUB_DAILY_STEP_HOURS: i64 = 6;
/// Local hour that receives the daily total
pub const DAILY_TOTAL_HOUR: i64 = 18;

/// Spread daily totals onto a 6-hourly axis.
///
/// The axis runs from midnight of the first day to 18:00 of the last day.
/// Each day's total lands in its 18:00 slot; the other three slots stay zero,
/// so the four slots of a day always sum to the daily value.
pub fn daily_to_sub_daily(daily: GriddedField) -> Result<GriddedField, NormalizeError> {
    let (Some(first), Some(last)) = (daily.times.first(), daily.times.last()) else {
        return Err(NormalizeError::EmptyWindow {
            variable: daily.name,
        });
    };

    if let Some(w) = daily
        .times
        .windows(2)
        .find(|w| w[0].date() == w[1].date())
    {
        return Err(NormalizeError::DuplicateDay {
            variable: daily.name.clone(),
            date: w[1].date(),
        });
    }

    let start = floor_day(first);
    let end = floor_day(last) + Duration::hours(DAILY_TOTAL_HOUR);
    let times = regular_axis(start, end, Duration::hours(SUB_DAILY_STEP_HOURS));

    let (_, nj, ni) = daily.shape();
    let mut data = Array3::<f32>::zeros((times.len(), nj, ni));

    for (day, t) in daily.times.iter().enumerate() {
        let slot = floor_day(t) + Duration::hours(DAILY_TOTAL_HOUR);
        let k = ((slot - start).num_hours() / SUB_DAILY_STEP_HOURS) as usize;
        data.index_axis_mut(Axis(0), k)
            .assign(&daily.data.index_axis(Axis(0), day));
    }

    Ok(GriddedField {
        times,
        data,
        ..daily
    })
}
