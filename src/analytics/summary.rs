use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{storage::entities::TimeIntervalEntity, utils::time::inclusive_days};

use super::bucketing::{in_period, validate, BucketError};

/// Headline numbers of a period, independent of how it gets bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_hours: f64,
    pub average_hours_per_day: f64,
    pub sessions: usize,
}

/// Totals sessions starting in `[period_start, period_end]`. The average is taken over every
/// calendar day the period touches, so for a single day it equals the total.
pub fn summarize<Tz: TimeZone>(
    records: &[TimeIntervalEntity],
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
) -> Result<Summary, BucketError> {
    validate(records, period_start, period_end)?;

    let (total_hours, sessions) = records
        .iter()
        .filter(|v| in_period(&v.start, period_start, period_end))
        .fold((0., 0), |(hours, count), v| (hours + v.hours(), count + 1));

    let days = inclusive_days(period_start.date_naive(), period_end.date_naive());

    Ok(Summary {
        total_hours,
        average_hours_per_day: total_hours / days as f64,
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::utils::time::{day_start, last_millisecond_before};

    fn period(first: NaiveDate, last: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            day_start(&Utc, first).unwrap(),
            last_millisecond_before(day_start(&Utc, last.succ_opt().unwrap()).unwrap()),
        )
    }

    fn session(id: &str, start: DateTime<Utc>, minutes: i64) -> TimeIntervalEntity {
        TimeIntervalEntity::new(start, start + Duration::minutes(minutes)).with_id(id)
    }

    #[test]
    fn test_single_day_average_is_total() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = period(day, day);
        let records = [
            session("a", Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(), 150),
            session("b", Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap(), 30),
        ];
        let summary = summarize(&records, &start, &end).unwrap();
        assert_eq!(summary.total_hours, 3.);
        assert_eq!(summary.average_hours_per_day, 3.);
        assert_eq!(summary.sessions, 2);
    }

    #[test]
    fn test_week_average_and_filtering() {
        let (start, end) = period(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 21).unwrap(),
        );
        let records = [
            session("tue", Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap(), 60 * 5),
            session("fri", Utc.with_ymd_and_hms(2024, 1, 19, 9, 0, 0).unwrap(), 60 * 9),
            session("next", Utc.with_ymd_and_hms(2024, 1, 22, 9, 0, 0).unwrap(), 60 * 8),
        ];
        let summary = summarize(&records, &start, &end).unwrap();
        assert_eq!(summary.total_hours, 14.);
        assert_eq!(summary.average_hours_per_day, 2.);
        assert_eq!(summary.sessions, 2);
    }

    #[test]
    fn test_empty() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = period(day, day);
        let summary = summarize(&[], &start, &end).unwrap();
        assert_eq!(summary.total_hours, 0.);
        assert_eq!(summary.average_hours_per_day, 0.);
        assert_eq!(summary.sessions, 0);
    }

    #[test]
    fn test_invalid_period() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = period(day, day);
        assert!(summarize(&[], &end, &start).is_err());
    }
}
