use anyhow::{bail, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};

use crate::{
    storage::{
        entities::{Annotation, TimeIntervalEntity},
        extract::{load_logs, ExtractConfig, LogQuery},
        record_storage::{delete_record, distinct_projects, update_record, RecordStorage},
    },
};

use super::{
    format::format_duration,
    selection::PeriodSelection,
    timer::AnnotationArgs,
    Args,
};

#[derive(Debug, Parser)]
pub struct LogsCommand {
    #[command(flatten)]
    selection: PeriodSelection,
    #[arg(long, short, help = "Only sessions of this project")]
    project: Option<String>,
}

pub async fn process_logs_command(
    storage: impl RecordStorage,
    LogsCommand { selection, project }: LogsCommand,
) -> Result<()> {
    let period = selection.resolve(Local::now())?;
    let query = LogQuery {
        range: ExtractConfig {
            start: period.start().to_utc(),
            end: period.end().to_utc(),
        },
        project,
    };
    let records = load_logs(storage, &query).await?;

    if records.is_empty() {
        println!("No sessions between {} and {}", period.first_date(), period.last_date());
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }

    let total = records
        .iter()
        .map(|v| v.duration())
        .fold(chrono::Duration::zero(), |acc, v| acc + v);
    println!();
    println!(
        "Total {} in {} sessions across {} projects",
        format_duration(total),
        records.len(),
        distinct_projects(&records).len()
    );
    Ok(())
}

fn print_record(record: &TimeIntervalEntity) {
    let start = record.start.with_timezone(&Local);
    let end = record.end.with_timezone(&Local);
    println!(
        "{}\t{} - {}\t{}\t{}\t{}\t{}",
        start.format("%x"),
        start.format("%H:%M"),
        end.format("%H:%M"),
        format_duration(record.duration()),
        record.title.as_deref().unwrap_or("-"),
        record.project.as_deref().unwrap_or("-"),
        record.id
    );
}

pub async fn process_projects_command(
    storage: impl RecordStorage,
    selection: PeriodSelection,
) -> Result<()> {
    let period = selection.resolve(Local::now())?;
    let query = LogQuery {
        range: ExtractConfig {
            start: period.start().to_utc(),
            end: period.end().to_utc(),
        },
        project: None,
    };
    let records = load_logs(storage, &query).await?;
    for project in distinct_projects(&records) {
        println!("{project}");
    }
    Ok(())
}

pub async fn process_edit_command(
    storage: impl RecordStorage,
    id: String,
    annotation: AnnotationArgs,
) -> Result<()> {
    let annotation = Annotation::from(annotation);
    if annotation.is_empty() {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "Nothing to change. Pass at least one of --title, --project or --description",
            )
            .into());
    }
    let Some(record) = update_record(&storage, &id, annotation).await? else {
        bail!("No session with id {id}");
    };
    print_record(&record);
    Ok(())
}

pub async fn process_delete_command(storage: impl RecordStorage, id: String) -> Result<()> {
    if !delete_record(&storage, &id).await? {
        bail!("No session with id {id}");
    }
    println!("Deleted session {id}");
    Ok(())
}
