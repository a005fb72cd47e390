use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// This is the standard way of converting a date to a record file name in worklog.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inverse of [date_to_record_name]. Anything that isn't a record file yields `None`.
pub fn record_name_to_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, "%Y-%m-%d").ok()
}

/// Maps a wall clock time onto `tz`. Ambiguous times resolve to the earlier instant, times
/// skipped by a DST gap move forward by an hour.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
}

/// Returns the first instant of `date` in `tz`.
pub fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).checked_add_months(Months::new(1))
}

/// Number of calendar days touched by `[start, end]`, counting both ends.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Last representable millisecond before `next`. Used to turn exclusive upper bounds into the
/// inclusive ones periods are expressed with.
pub fn last_millisecond_before<Tz: TimeZone>(next: DateTime<Tz>) -> DateTime<Tz> {
    next - Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike, Utc};

    use super::*;

    #[test]
    fn test_week_start_is_monday() {
        // 2024-01-17 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        assert_eq!(week_start(date), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(week_start(monday), monday);
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
        assert_eq!(week_start(sunday), monday);
    }

    #[test]
    fn test_month_boundaries() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(
            next_month_start(date),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
    }

    #[test]
    fn test_inclusive_days() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(inclusive_days(day, day), 1);
        assert_eq!(
            inclusive_days(day, NaiveDate::from_ymd_opt(2024, 1, 21).unwrap()),
            7
        );
    }

    #[test]
    fn test_record_name_round_trip() {
        let day = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();
        assert_eq!(date_to_record_name(day), "2018-07-04");
        assert_eq!(record_name_to_date("2018-07-04"), Some(day));
        assert_eq!(record_name_to_date("notes.json"), None);
    }

    #[test]
    fn test_last_millisecond_before() {
        let next = day_start(&Utc, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()).unwrap();
        let last = last_millisecond_before(next);
        assert_eq!(last.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(last.hour(), 23);
        assert_eq!(last.nanosecond(), 999_000_000);
    }
}
