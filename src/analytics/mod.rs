//! Analytics over logged sessions. [bucketing::bucketize] turns a period into a gap free
//! sequence of calendar buckets for charting, [summary::summarize] produces the headline totals
//! and [report] bundles both with the session list for display or export.

pub mod bucketing;
pub mod period;
pub mod summary;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::entities::TimeIntervalEntity;

use bucketing::{
    bucketize, in_period, resolve_granularity, validate, Bucket, BucketError, Granularity,
    GranularityHint,
};
use period::Period;
use summary::{summarize, Summary};

/// Everything that selects what a report shows. Passed explicitly instead of living in shared
/// state.
#[derive(Debug, Clone)]
pub struct AnalyticsQuery<Tz: TimeZone> {
    pub period: Period<Tz>,
    pub granularity: GranularityHint,
    pub project: Option<String>,
}

impl<Tz: TimeZone> AnalyticsQuery<Tz> {
    /// Query charted the default way for `period`.
    pub fn new(period: Period<Tz>) -> Self {
        Self {
            granularity: period.granularity_hint(),
            period,
            project: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub granularity: Granularity,
    pub summary: Summary,
    pub buckets: Vec<Bucket>,
    /// Sessions the report is made of, oldest first.
    pub records: Vec<TimeIntervalEntity>,
}

/// Builds the full report for `query`. Every session is validated, then the ones starting
/// outside of the period or belonging to another project are dropped.
pub fn report<Tz: TimeZone>(
    records: Vec<TimeIntervalEntity>,
    query: &AnalyticsQuery<Tz>,
) -> Result<Report, BucketError> {
    let start = query.period.start();
    let end = query.period.end();

    validate(&records, start, end)?;

    let mut selected = records
        .into_iter()
        .filter(|v| in_period(&v.start, start, end))
        .filter(|v| v.belongs_to(query.project.as_deref()))
        .collect::<Vec<_>>();
    selected.sort_by_key(|v| v.start);

    let buckets = bucketize(&selected, start.clone(), end.clone(), query.granularity)?;
    let summary = summarize(&selected, start, end)?;

    Ok(Report {
        title: query.period.title(),
        period_start: start.to_utc(),
        period_end: end.to_utc(),
        project: query.project.clone(),
        granularity: resolve_granularity(query.granularity, start, end),
        summary,
        buckets,
        records: selected,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::storage::entities::Annotation;

    fn session(id: &str, start: DateTime<Utc>, minutes: i64, project: &str) -> TimeIntervalEntity {
        TimeIntervalEntity::new(start, start + Duration::minutes(minutes))
            .with_id(id)
            .with_annotation(Annotation {
                project: Some(project.into()),
                ..Default::default()
            })
    }

    #[test]
    fn test_report_for_month() {
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap();
        let query = AnalyticsQuery::new(Period::this_month(&now).unwrap());
        let records = vec![
            session("b", Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(), 60, "web"),
            session("a", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(), 120, "api"),
            session("out", Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(), 60, "web"),
        ];

        let report = report(records, &query).unwrap();

        assert_eq!(report.title, "Monthly Hours by Week");
        assert_eq!(report.granularity, Granularity::Week);
        assert_eq!(report.buckets.len(), 5);
        assert_eq!(report.buckets[0].hours, 2.);
        assert_eq!(report.buckets[1].hours, 1.);
        assert_eq!(report.summary.total_hours, 3.);
        assert_eq!(report.summary.sessions, 2);
        let ids = report.records.iter().map(|v| &*v.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_report_project_filter() {
        let period = Period::custom(
            &Utc,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap();
        let query = AnalyticsQuery {
            project: Some("web".into()),
            ..AnalyticsQuery::new(period)
        };
        let records = vec![
            session("a", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(), 60, "web"),
            session("b", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(), 60, "api"),
            // matches the project but starts outside of the period
            session("c", Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap(), 60, "web"),
        ];

        let report = report(records, &query).unwrap();

        assert_eq!(report.granularity, Granularity::Day);
        assert_eq!(report.buckets.len(), 3);
        assert_eq!(report.summary.sessions, 1);
        assert_eq!(report.summary.total_hours, 1.);
        assert_eq!(report.summary.average_hours_per_day, 1. / 3.);
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let query = AnalyticsQuery::new(Period::today(&now).unwrap());
        let report = report(vec![], &query).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["granularity"], "day");
        assert_eq!(json["buckets"][0]["sessions"], 0);
        assert_eq!(json["period_start"], "2024-01-15T00:00:00Z");
    }
}
