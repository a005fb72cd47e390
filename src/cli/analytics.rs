use std::path::PathBuf;

use ansi_term::Colour;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::{
    analytics::{
        bucketing::{Granularity, GranularityHint},
        report, AnalyticsQuery, Report,
    },
    storage::{
        extract::{collect_between, ExtractConfig},
        record_storage::RecordStorage,
    },
    utils::percentage::hours_percentage,
};

use super::{
    format::{format_duration, format_hours},
    selection::PeriodSelection,
};

const BAR_WIDTH: f64 = 40.;

#[derive(Debug, Parser)]
pub struct AnalyticsCommand {
    #[command(flatten)]
    selection: PeriodSelection,
    #[arg(long, short, help = "Only sessions of this project")]
    project: Option<String>,
    #[arg(
        long = "by",
        short,
        help = "Calendar unit of the chart. By default it's picked from the period"
    )]
    granularity: Option<Granularity>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Write the report as json instead of printing it. Defaults to time-tracker-report-<start>-to-<end>.json"
    )]
    export: Option<Option<PathBuf>>,
}

pub async fn process_analytics_command(
    storage: impl RecordStorage,
    AnalyticsCommand {
        selection,
        project,
        granularity,
        export,
    }: AnalyticsCommand,
) -> Result<()> {
    let period = selection.resolve(Local::now())?;
    let records = collect_between(
        storage,
        ExtractConfig {
            start: period.start().to_utc(),
            end: period.end().to_utc(),
        },
    )
    .await?;

    let query = AnalyticsQuery {
        granularity: granularity.map_or(period.granularity_hint(), GranularityHint::Exact),
        period,
        project,
    };
    let report = report(records, &query)?;

    match export {
        Some(path) => {
            let path = path.unwrap_or_else(|| default_export_name(&report));
            export_report(&report, &path).await
        }
        None => {
            print_report(&report);
            Ok(())
        }
    }
}

pub fn default_export_name(report: &Report) -> PathBuf {
    PathBuf::from(format!(
        "time-tracker-report-{}-to-{}.json",
        report.period_start.with_timezone(&Local).format("%Y-%m-%d"),
        report.period_end.with_timezone(&Local).format("%Y-%m-%d")
    ))
}

async fn export_report(report: &Report, path: &PathBuf) -> Result<()> {
    let content = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to export report to {path:?}"))?;
    info!("Exported report to {path:?}");
    println!("Report saved to {}", path.display());
    Ok(())
}

fn print_report(report: &Report) {
    println!("{}", Colour::White.bold().paint(&report.title));
    if let Some(project) = &report.project {
        println!("Project: {project}");
    }
    println!();
    println!("Total Hours\t{}", format_hours(report.summary.total_hours));
    println!(
        "Avg/Day\t\t{}",
        format_hours(report.summary.average_hours_per_day)
    );
    println!("Sessions\t{}", report.summary.sessions);
    println!();

    for line in chart_lines(report) {
        println!("{line}");
    }

    if report.records.is_empty() {
        return;
    }
    println!();
    for record in report.records.iter().rev() {
        let start = record.start.with_timezone(&Local);
        println!(
            "{}\t{}\t{}\t{}\t{}",
            start.format("%x %H:%M"),
            format_duration(record.duration()),
            record.project.as_deref().unwrap_or("-"),
            record.title.as_deref().unwrap_or("-"),
            record.description.as_deref().unwrap_or("")
        );
    }
}

/// Horizontal bars scaled to the busiest bucket, annotated with hours and share of the total.
fn chart_lines(report: &Report) -> Vec<String> {
    let max = report
        .buckets
        .iter()
        .map(|v| v.hours)
        .fold(0., f64::max);
    let label_width = report
        .buckets
        .iter()
        .map(|v| v.label.chars().count())
        .max()
        .unwrap_or(0);

    report
        .buckets
        .iter()
        .map(|bucket| {
            let width = if max > 0. {
                (bucket.hours / max * BAR_WIDTH).round() as usize
            } else {
                0
            };
            // escape codes would break width based padding, so the bar is padded by hand
            format!(
                "{:label_width$}  {}{}  {}\t{}",
                bucket.label,
                Colour::Blue.paint("█".repeat(width)),
                " ".repeat(BAR_WIDTH as usize - width),
                format_hours(bucket.hours),
                hours_percentage(bucket.hours, report.summary.total_hours),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        analytics::period::Period,
        storage::entities::TimeIntervalEntity,
    };

    fn week_report() -> Report {
        let now = Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap();
        let friday = Utc.with_ymd_and_hms(2024, 1, 19, 9, 0, 0).unwrap();
        let records = vec![
            TimeIntervalEntity::new(tuesday, tuesday + Duration::hours(1)),
            TimeIntervalEntity::new(friday, friday + Duration::hours(3)),
        ];
        report(
            records,
            &AnalyticsQuery::new(Period::this_week(&now).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_chart_lines() {
        let report = week_report();
        let lines = chart_lines(&report);
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("Mon 15"));
        assert!(lines[0].ends_with("0h 0m\t0%"));
        assert!(lines[1].ends_with("1h 0m\t25%"));
        assert!(lines[4].ends_with("3h 0m\t75%"));
    }

    #[test]
    fn test_default_export_name() {
        let report = week_report();
        let name = default_export_name(&report);
        let name = name.to_string_lossy();
        assert!(name.starts_with("time-tracker-report-"));
        assert!(name.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_export_report() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");
        let report = week_report();

        export_report(&report, &path).await?;

        let content = std::fs::read_to_string(&path)?;
        let restored: Report = serde_json::from_str(&content)?;
        assert_eq!(restored, report);
        Ok(())
    }
}
