pub mod analytics;
pub mod format;
pub mod logs;
pub mod notes;
pub mod selection;
pub mod timer;

use std::path::{Path, PathBuf};

use analytics::{process_analytics_command, AnalyticsCommand};
use anyhow::Result;
use clap::{Parser, Subcommand};
use logs::{
    process_delete_command, process_edit_command, process_logs_command, process_projects_command,
    LogsCommand,
};
use notes::{
    process_folder_command, process_goal_command, process_note_command, FolderCommand,
    GoalCommand, NoteCommand,
};
use selection::PeriodSelection;
use timer::{process_add, process_start, process_status, process_stop, AddCommand, AnnotationArgs};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    notes::store::NotesStore,
    storage::{active_session::ActiveSessionStore, record_storage::RecordStorageImpl},
    tracker::timer::Timer,
    utils::{
        clock::SystemClock,
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "worklog", version, long_about = None)]
#[command(about = "Track work sessions, review where the time went and keep notes", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to stdout")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start a work session")]
    Start {},
    #[command(about = "Stop the running session and save it")]
    Stop {
        #[command(flatten)]
        annotation: AnnotationArgs,
    },
    #[command(about = "Show how long the current session has been running")]
    Status {
        #[arg(long, short, help = "Keep refreshing every second until Ctrl-C")]
        watch: bool,
    },
    #[command(about = "Add a session that wasn't timed")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "List sessions of a period")]
    Logs {
        #[command(flatten)]
        command: LogsCommand,
    },
    #[command(about = "List projects used in a period")]
    Projects {
        #[command(flatten)]
        selection: PeriodSelection,
    },
    #[command(about = "Change the title, project or description of a session")]
    Edit {
        id: String,
        #[command(flatten)]
        annotation: AnnotationArgs,
    },
    #[command(about = "Delete a session")]
    Delete { id: String },
    #[command(about = "Chart hours worked over a period")]
    Analytics {
        #[command(flatten)]
        command: AnalyticsCommand,
    },
    #[command(about = "Manage note folders")]
    Folder {
        #[command(subcommand)]
        command: FolderCommand,
    },
    #[command(about = "Manage notes")]
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    #[command(about = "Manage goals")]
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&ensure_dir(dir.join("logs"))?, logging_level, args.log)?;
    debug!("Using application directory {dir:?}");

    match args.commands {
        Commands::Start {} => process_start(&create_timer(&dir)?).await,
        Commands::Stop { annotation } => process_stop(&create_timer(&dir)?, annotation).await,
        Commands::Status { watch } => process_status(&create_timer(&dir)?, watch).await,
        Commands::Add { command } => process_add(&create_timer(&dir)?, command).await,
        Commands::Logs { command } => process_logs_command(create_storage(&dir)?, command).await,
        Commands::Projects { selection } => {
            process_projects_command(create_storage(&dir)?, selection).await
        }
        Commands::Edit { id, annotation } => {
            process_edit_command(create_storage(&dir)?, id, annotation).await
        }
        Commands::Delete { id } => process_delete_command(create_storage(&dir)?, id).await,
        Commands::Analytics { command } => {
            process_analytics_command(create_storage(&dir)?, command).await
        }
        Commands::Folder { command } => process_folder_command(&create_notes(&dir), command).await,
        Commands::Note { command } => process_note_command(&create_notes(&dir), command).await,
        Commands::Goal { command } => process_goal_command(&create_notes(&dir), command).await,
    }
}

fn create_storage(dir: &Path) -> Result<RecordStorageImpl> {
    Ok(RecordStorageImpl::new(dir.join("records"))?)
}

fn create_timer(dir: &Path) -> Result<Timer<RecordStorageImpl>> {
    Ok(Timer::new(
        create_storage(dir)?,
        ActiveSessionStore::new(dir.to_path_buf()),
        Box::new(SystemClock),
    ))
}

fn create_notes(dir: &Path) -> NotesStore {
    NotesStore::new(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, Commands};

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["worklog", "logs", "--week", "--dir", "/tmp/x", "--log"])
            .unwrap();
        assert!(args.log);
        assert_eq!(args.dir, Some("/tmp/x".into()));
        assert!(matches!(args.commands, Commands::Logs { .. }));
    }

    #[test]
    fn test_export_without_value() {
        let args = Args::try_parse_from(["worklog", "analytics", "--year", "--export"]).unwrap();
        assert!(matches!(args.commands, Commands::Analytics { .. }));
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
