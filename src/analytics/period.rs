use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use clap::ValueEnum;
use now::DateTimeNow;
use serde::{Deserialize, Serialize};

use crate::utils::time::{
    day_start, inclusive_days, last_millisecond_before, next_month_start, week_start,
};

use super::bucketing::{BucketError, Granularity, GranularityHint};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Today,
    Week,
    Month,
    Year,
    Custom,
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodKind::Today => write!(f, "today"),
            PeriodKind::Week => write!(f, "week"),
            PeriodKind::Month => write!(f, "month"),
            PeriodKind::Year => write!(f, "year"),
            PeriodKind::Custom => write!(f, "custom"),
        }
    }
}

/// Inclusive range of whole days in a time zone. `end` is the last millisecond of the last day.
#[derive(Debug, Clone, PartialEq)]
pub struct Period<Tz: TimeZone> {
    kind: PeriodKind,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl<Tz: TimeZone> Period<Tz> {
    pub fn today(now: &DateTime<Tz>) -> Result<Self, BucketError> {
        let date = now.clone().beginning_of_day().date_naive();
        Self::from_dates(PeriodKind::Today, &now.timezone(), date, date)
    }

    /// Monday to Sunday around `now`.
    pub fn this_week(now: &DateTime<Tz>) -> Result<Self, BucketError> {
        let first = week_start(now.date_naive());
        Self::from_dates(
            PeriodKind::Week,
            &now.timezone(),
            first,
            first + Duration::days(6),
        )
    }

    pub fn this_month(now: &DateTime<Tz>) -> Result<Self, BucketError> {
        let first = now.clone().beginning_of_month().date_naive();
        let last = next_month_start(first)
            .and_then(|v| v.pred_opt())
            .unwrap_or(first);
        Self::from_dates(PeriodKind::Month, &now.timezone(), first, last)
    }

    pub fn this_year(now: &DateTime<Tz>) -> Result<Self, BucketError> {
        let first = now.clone().beginning_of_year().date_naive();
        let last = NaiveDate::from_ymd_opt(first.year(), 12, 31).unwrap_or(first);
        Self::from_dates(PeriodKind::Year, &now.timezone(), first, last)
    }

    pub fn custom(tz: &Tz, first: NaiveDate, last: NaiveDate) -> Result<Self, BucketError> {
        Self::from_dates(PeriodKind::Custom, tz, first, last)
    }

    pub fn quick_select(kind: PeriodKind, now: &DateTime<Tz>) -> Result<Self, BucketError> {
        match kind {
            PeriodKind::Today | PeriodKind::Custom => Self::today(now),
            PeriodKind::Week => Self::this_week(now),
            PeriodKind::Month => Self::this_month(now),
            PeriodKind::Year => Self::this_year(now),
        }
    }

    fn from_dates(
        kind: PeriodKind,
        tz: &Tz,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Self, BucketError> {
        let unrepresentable =
            |date: NaiveDate| BucketError::UnrepresentableTime(date.and_time(chrono::NaiveTime::MIN));
        let start = day_start(tz, first).ok_or_else(|| unrepresentable(first))?;
        let after_last = last.succ_opt().ok_or_else(|| unrepresentable(last))?;
        let end = day_start(tz, after_last)
            .map(last_millisecond_before)
            .ok_or_else(|| unrepresentable(after_last))?;
        if start > end {
            return Err(BucketError::InvalidPeriod {
                start: start.to_utc(),
                end: end.to_utc(),
            });
        }
        Ok(Self { kind, start, end })
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn first_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    pub fn days(&self) -> i64 {
        inclusive_days(self.first_date(), self.last_date())
    }

    /// Quick selections always chart the same way, custom ranges depend on their length.
    pub fn granularity_hint(&self) -> GranularityHint {
        match self.kind {
            PeriodKind::Today | PeriodKind::Week => GranularityHint::Exact(Granularity::Day),
            PeriodKind::Month => GranularityHint::Exact(Granularity::Week),
            PeriodKind::Year => GranularityHint::Exact(Granularity::Month),
            PeriodKind::Custom => GranularityHint::Auto,
        }
    }

    pub fn title(&self) -> String {
        match self.kind {
            PeriodKind::Today => "Today's Hours".into(),
            PeriodKind::Week => "Weekly Hours Worked".into(),
            PeriodKind::Month => "Monthly Hours by Week".into(),
            PeriodKind::Year => "Yearly Hours by Month".into(),
            PeriodKind::Custom => format!(
                "Hours Worked ({} - {})",
                self.first_date().format("%b %d"),
                self.last_date().format("%b %d")
            ),
        }
    }
}
