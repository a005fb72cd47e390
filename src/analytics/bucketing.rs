use std::{collections::HashSet, fmt::Display};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, trace};

use crate::{
    storage::entities::TimeIntervalEntity,
    utils::time::{
        day_start, inclusive_days, last_millisecond_before, month_start, next_month_start,
        resolve_local, week_start,
    },
};

/// Calendar unit a period is split into.
#[derive(
    Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl Granularity {
    /// Picks a unit for a period touching `days` calendar days.
    pub fn for_span(days: i64) -> Self {
        match days {
            ..=7 => Granularity::Day,
            8..=90 => Granularity::Week,
            _ => Granularity::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityHint {
    /// Derive the unit from the length of the period.
    Auto,
    Exact(Granularity),
}

impl From<Option<Granularity>> for GranularityHint {
    fn from(value: Option<Granularity>) -> Self {
        value.map_or(GranularityHint::Auto, GranularityHint::Exact)
    }
}

/// Aggregated sessions of one calendar unit. `start` and `end` are inclusive and clipped to the
/// period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub hours: f64,
    pub sessions: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("Period starts at {start} which is after its end at {end}")]
    InvalidPeriod {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Session {id} ends at {end} before it starts at {start}")]
    InvalidRecord {
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Session {0} appears more than once")]
    DuplicateRecord(String),
    #[error("Can't place {0} in the period's time zone")]
    UnrepresentableTime(NaiveDateTime),
}

/// Checks the period bounds and every session before anything gets aggregated, so a failing call
/// never produces partial output.
pub(crate) fn validate<Tz: TimeZone>(
    records: &[TimeIntervalEntity],
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
) -> Result<(), BucketError> {
    if period_start > period_end {
        return Err(BucketError::InvalidPeriod {
            start: period_start.to_utc(),
            end: period_end.to_utc(),
        });
    }

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !record.is_well_formed() {
            return Err(BucketError::InvalidRecord {
                id: record.id.to_string(),
                start: record.start,
                end: record.end,
            });
        }
        if !seen.insert(&*record.id) {
            return Err(BucketError::DuplicateRecord(record.id.to_string()));
        }
    }
    Ok(())
}

/// Whether a session starting at `instant` falls in the inclusive period.
pub(crate) fn in_period<Tz: TimeZone>(
    instant: &DateTime<Utc>,
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
) -> bool {
    *instant >= period_start.to_utc() && *instant <= period_end.to_utc()
}

/// Resolves `hint` into the unit actually used for the period.
pub fn resolve_granularity<Tz: TimeZone>(
    hint: GranularityHint,
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
) -> Granularity {
    match hint {
        GranularityHint::Exact(granularity) => granularity,
        GranularityHint::Auto => Granularity::for_span(inclusive_days(
            period_start.date_naive(),
            period_end.date_naive(),
        )),
    }
}

/// Splits `[period_start, period_end]` into calendar aligned buckets and sums up the sessions
/// starting in each of them.
///
/// A session is attributed as a whole to the bucket containing its start, even when it runs
/// past the end of that bucket. Sessions starting outside of the period are ignored. Every unit
/// touching the period gets a bucket, empty ones included, so the result only depends on the
/// period and the granularity.
#[instrument(skip(records), fields(records = records.len()))]
pub fn bucketize<Tz: TimeZone>(
    records: &[TimeIntervalEntity],
    period_start: DateTime<Tz>,
    period_end: DateTime<Tz>,
    hint: GranularityHint,
) -> Result<Vec<Bucket>, BucketError> {
    validate(records, &period_start, &period_end)?;

    let granularity = resolve_granularity(hint, &period_start, &period_end);
    let spans = bucket_spans(&period_start, &period_end, granularity)?;
    let multi_year = period_start.year() != period_end.year();

    let mut buckets = spans
        .iter()
        .map(|span| Bucket {
            label: label(granularity, span, multi_year),
            start: span.start.to_utc(),
            end: span.end.to_utc(),
            hours: 0.,
            sessions: 0,
        })
        .collect::<Vec<_>>();

    // Spans are half-open internally. A bucket's inclusive `end` is only for display, since
    // instants inside its last millisecond still belong to it.
    let next_starts = spans.iter().map(|v| v.next.to_utc()).collect::<Vec<_>>();
    let last = buckets.len() - 1;
    for record in records
        .iter()
        .filter(|v| in_period(&v.start, &period_start, &period_end))
    {
        let index = next_starts
            .partition_point(|next| *next <= record.start)
            .min(last);
        trace!("{} goes to {}", record.id, buckets[index].label);
        buckets[index].hours += record.hours();
        buckets[index].sessions += 1;
    }

    Ok(buckets)
}

/// One calendar unit clipped to the period. `start` and `end` are inclusive, `next` is the
/// unclipped start of the following unit.
#[derive(Debug, Clone)]
struct BucketSpan<Tz: TimeZone> {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    next: DateTime<Tz>,
}

fn bucket_spans<Tz: TimeZone>(
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
    granularity: Granularity,
) -> Result<Vec<BucketSpan<Tz>>, BucketError> {
    let mut spans = vec![];
    let mut unit_start = unit_floor(period_start, granularity)?;
    while unit_start <= *period_end {
        let next = next_unit(&unit_start, granularity)?;
        let start = unit_start.clone().max(period_start.clone());
        let end = last_millisecond_before(next.clone()).min(period_end.clone());
        spans.push(BucketSpan {
            start,
            end,
            next: next.clone(),
        });
        unit_start = next;
    }
    Ok(spans)
}

/// Start of the unit containing `instant`, in the time zone of `instant`.
fn unit_floor<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    granularity: Granularity,
) -> Result<DateTime<Tz>, BucketError> {
    let date = instant.date_naive();
    match granularity {
        Granularity::Hour => {
            let local = instant.naive_local();
            let hour_start = local
                .with_minute(0)
                .and_then(|v| v.with_second(0))
                .and_then(|v| v.with_nanosecond(0))
                .unwrap_or(local);
            let resolved = resolve_local(&instant.timezone(), hour_start)
                .ok_or(BucketError::UnrepresentableTime(hour_start))?;
            // a skipped hour resolves past the instant itself
            Ok(resolved.min(instant.clone()))
        }
        Granularity::Day => local_midnight(instant, date),
        Granularity::Week => local_midnight(instant, week_start(date)),
        Granularity::Month => local_midnight(instant, month_start(date)),
    }
}

/// Start of the unit following the one starting at `unit_start`.
fn next_unit<Tz: TimeZone>(
    unit_start: &DateTime<Tz>,
    granularity: Granularity,
) -> Result<DateTime<Tz>, BucketError> {
    let date = unit_start.date_naive();
    let next_date = match granularity {
        Granularity::Hour => return Ok(unit_start.clone() + Duration::hours(1)),
        Granularity::Day => date.succ_opt(),
        Granularity::Week => date.checked_add_signed(Duration::days(7)),
        Granularity::Month => next_month_start(date),
    };
    let next_date = next_date.ok_or(BucketError::UnrepresentableTime(unit_start.naive_local()))?;
    local_midnight(unit_start, next_date)
}

fn local_midnight<Tz: TimeZone>(
    reference: &DateTime<Tz>,
    date: NaiveDate,
) -> Result<DateTime<Tz>, BucketError> {
    day_start(&reference.timezone(), date)
        .ok_or_else(|| BucketError::UnrepresentableTime(date.and_time(chrono::NaiveTime::MIN)))
}

fn label<Tz: TimeZone>(granularity: Granularity, span: &BucketSpan<Tz>, multi_year: bool) -> String {
    let start = span.start.naive_local();
    let end = span.end.naive_local();
    match granularity {
        Granularity::Hour => start.format("%H:00").to_string(),
        Granularity::Day => start.format("%a %d").to_string(),
        Granularity::Week => format!("{}-{}", start.format("%d.%m"), end.format("%d.%m")),
        Granularity::Month if multi_year => start.format("%b %Y").to_string(),
        Granularity::Month => start.format("%b").to_string(),
    }
}
