use std::io::Write;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::{
    storage::{entities::Annotation, record_storage::RecordStorage},
    tracker::timer::{watch_elapsed, Timer},
    utils::shutdown::detect_shutdown,
};

use super::{
    format::{format_duration, format_elapsed},
    selection::{parse_moment, DateStyle},
};

#[derive(Debug, Clone, Default, clap::Args)]
pub struct AnnotationArgs {
    #[arg(long, help = "Short title of the session. An empty value clears it")]
    title: Option<String>,
    #[arg(long, help = "Project the session belongs to. An empty value clears it")]
    project: Option<String>,
    #[arg(long, help = "Longer description. An empty value clears it")]
    description: Option<String>,
}

impl From<AnnotationArgs> for Annotation {
    fn from(value: AnnotationArgs) -> Self {
        Annotation {
            title: value.title,
            project: value.project,
            description: value.description,
        }
    }
}

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(
        long = "start",
        short,
        help = "Start of the session. Examples are \"9:00\", \"yesterday 14:30\", \"12:00 16/03/2025\""
    )]
    start: String,
    #[arg(long = "end", short, help = "End of the session, same format as start")]
    end: String,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[command(flatten)]
    annotation: AnnotationArgs,
}

pub async fn process_start(timer: &Timer<impl RecordStorage>) -> Result<()> {
    let session = timer.start().await?;
    println!(
        "Started working at {}",
        session.start.with_timezone(&Local).format("%H:%M:%S")
    );
    Ok(())
}

pub async fn process_stop(timer: &Timer<impl RecordStorage>, annotation: AnnotationArgs) -> Result<()> {
    let record = timer.stop(annotation.into()).await?;
    println!(
        "Stopped after {}. Session saved as {}",
        format_duration(record.duration()),
        record.id
    );
    Ok(())
}

/// Prints the running timer. With `watch` it keeps refreshing until Ctrl-C.
pub async fn process_status(timer: &Timer<impl RecordStorage>, watch: bool) -> Result<()> {
    let Some(status) = timer.status().await? else {
        println!("No session is running");
        return Ok(());
    };
    println!(
        "Working since {}",
        status.session.start.with_timezone(&Local).format("%x %H:%M:%S")
    );
    if !watch {
        println!("{}", format_elapsed(status.elapsed));
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let mut stdout = std::io::stdout();
    tokio::join!(
        detect_shutdown(shutdown.clone()),
        watch_elapsed(timer.clock(), status.session.start, shutdown, |elapsed| {
            let _ = write!(stdout, "\r{}", format_elapsed(elapsed));
            let _ = stdout.flush();
        }),
    );
    println!();
    Ok(())
}

pub async fn process_add(
    timer: &Timer<impl RecordStorage>,
    AddCommand {
        start,
        end,
        date_style,
        annotation,
    }: AddCommand,
) -> Result<()> {
    let now = Local::now();
    let start = parse_moment(&start, now, date_style, "start")?;
    let end = parse_moment(&end, now, date_style, "end")?;
    let record = timer.add_manual(start, end, annotation.into()).await?;
    println!(
        "Added {} session {}",
        format_duration(record.duration()),
        record.id
    );
    Ok(())
}
