use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::analytics::period::{Period, PeriodKind};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

const DATE_EXAMPLES: &str =
    "Examples are \"yesterday\", \"monday\", \"15/03/2025\", \"2 weeks ago\"";

/// Which days a command looks at. Quick selections are relative to today, `--start`/`--end`
/// select whole days and default to today when only one of them is given.
#[derive(Debug, Clone, clap::Args)]
pub struct PeriodSelection {
    #[arg(long, help = "Only today", conflicts_with_all = ["week", "month", "year", "start_date", "end_date"])]
    today: bool,
    #[arg(long, help = "Monday to Sunday of the current week", conflicts_with_all = ["month", "year", "start_date", "end_date"])]
    week: bool,
    #[arg(long, help = "The current month", conflicts_with_all = ["year", "start_date", "end_date"])]
    month: bool,
    #[arg(long, help = "The current year", conflicts_with_all = ["start_date", "end_date"])]
    year: bool,
    #[arg(long = "start", short, help = format!("First day of a custom range. {DATE_EXAMPLES}"))]
    start_date: Option<String>,
    #[arg(long = "end", short, help = format!("Last day of a custom range. {DATE_EXAMPLES}"))]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl PeriodSelection {
    fn kind(&self) -> PeriodKind {
        if self.start_date.is_some() || self.end_date.is_some() {
            PeriodKind::Custom
        } else if self.week {
            PeriodKind::Week
        } else if self.month {
            PeriodKind::Month
        } else if self.year {
            PeriodKind::Year
        } else {
            PeriodKind::Today
        }
    }

    pub fn resolve(&self, now: DateTime<Local>) -> Result<Period<Local>> {
        let kind = self.kind();
        if kind != PeriodKind::Custom {
            return Ok(Period::quick_select(kind, &now)?);
        }

        let start = parse_date(self.start_date.as_deref(), now, self.date_style, "start")?;
        let end = parse_date(self.end_date.as_deref(), now, self.date_style, "end")?;
        Period::custom(&Local, start.date_naive(), end.date_naive()).map_err(|e| {
            Args::command()
                .error(clap::error::ErrorKind::ValueValidation, e.to_string())
                .into()
        })
    }
}

/// Parses a human readable date relative to `now`. A missing value means `now`.
pub fn parse_date(
    value: Option<&str>,
    now: DateTime<Local>,
    style: DateStyle,
    name: &str,
) -> Result<DateTime<Local>> {
    match value.map(|s| parse_date_string(s, now, style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local)),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {name} date {e}"),
            )
            .into()),
        None => Ok(now),
    }
}

/// Parses a precise moment for manually added sessions.
pub fn parse_moment(
    value: &str,
    now: DateTime<Local>,
    style: DateStyle,
    name: &str,
) -> Result<DateTime<Utc>> {
    parse_date(Some(value), now, style, name).map(|v| v.with_timezone(&Utc))
}
