use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;

use crate::notes::{
    entities::{
        Folder, Goal, GoalChanges, GoalDraft, Note, NoteChanges, NoteDraft, NotesDocument,
        NotesError, Priority,
    },
    filter::{GoalFilter, NoteFilter},
    store::NotesStore,
};

use super::selection::{parse_date, DateStyle};

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    #[command(about = "Create a folder")]
    Add {
        name: String,
        #[arg(long, help = "Hex color like #3B82F6")]
        color: Option<String>,
    },
    #[command(about = "List folders, oldest first")]
    List {},
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    #[command(about = "Create a note")]
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, default_value = "", help = "Comma separated tags")]
        tags: String,
        #[arg(long, help = "Folder name or id")]
        folder: Option<String>,
    },
    #[command(about = "Change a note")]
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, help = "Comma separated tags, replaces the current ones")]
        tags: Option<String>,
        #[arg(long, help = "Folder name or id. An empty value removes the note from its folder")]
        folder: Option<String>,
    },
    #[command(about = "Delete a note")]
    Delete { id: String },
    #[command(about = "Toggle whether a note is a favorite")]
    Favorite { id: String },
    #[command(about = "Archive a note, or bring an archived one back")]
    Archive { id: String },
    #[command(about = "List notes, most recently updated first")]
    List {
        #[arg(long, short, help = "Match title, content or tags")]
        search: Option<String>,
        #[arg(long, help = "Folder name or id")]
        folder: Option<String>,
        #[arg(long)]
        favorites: bool,
        #[arg(long, help = "Updated within the last 3 days")]
        recent: bool,
        #[arg(long, help = "Show archived notes instead of active ones")]
        archived: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    #[command(about = "Create a goal")]
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, help = "Due date. Examples are \"friday\", \"15/03/2025\"")]
        due: Option<String>,
        #[arg(long, help = "Folder name or id")]
        folder: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk)]
        date_style: DateStyle,
    },
    #[command(about = "Change a goal")]
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, help = "An empty value clears the description")]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, help = "Folder name or id. An empty value removes the goal from its folder")]
        folder: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk)]
        date_style: DateStyle,
    },
    #[command(about = "Mark a goal completed, or not completed again")]
    Toggle { id: String },
    #[command(about = "Delete a goal")]
    Delete { id: String },
    #[command(about = "List goals, newest first")]
    List {
        #[arg(long, short, help = "Match title or description")]
        search: Option<String>,
        #[arg(long, help = "Folder name or id")]
        folder: Option<String>,
    },
}

pub async fn process_folder_command(store: &NotesStore, command: FolderCommand) -> Result<()> {
    match command {
        FolderCommand::Add { name, color } => {
            let folder = store
                .update(|document| document.add_folder(&name, color.as_deref(), Utc::now()))
                .await?;
            print_folder(&folder);
        }
        FolderCommand::List {} => {
            let document = store.read().await?;
            for folder in document.folders() {
                print_folder(folder);
            }
        }
    }
    Ok(())
}

pub async fn process_note_command(store: &NotesStore, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Add {
            title,
            content,
            tags,
            folder,
        } => {
            let draft = NoteDraft {
                title,
                content,
                tags,
                folder,
            };
            let note = store
                .update(|document| document.add_note(draft, Utc::now()))
                .await?;
            println!("Created note {}", note.id);
        }
        NoteCommand::Edit {
            id,
            title,
            content,
            tags,
            folder,
        } => {
            let changes = NoteChanges {
                title,
                content,
                tags,
                folder,
            };
            let note = store
                .update(|document| document.edit_note(&id, changes, Utc::now()))
                .await?;
            println!("Updated note {}", note.id);
        }
        NoteCommand::Delete { id } => {
            let note = store.update(|document| document.delete_note(&id)).await?;
            println!("Deleted note {}", note.title);
        }
        NoteCommand::Favorite { id } => {
            let note = store
                .update(|document| document.toggle_favorite(&id, Utc::now()))
                .await?;
            let state = if note.is_favorite { "Added to" } else { "Removed from" };
            println!("{state} favorites: {}", note.title);
        }
        NoteCommand::Archive { id } => {
            let note = store
                .update(|document| document.toggle_archived(&id, Utc::now()))
                .await?;
            let state = if note.is_archived { "Archived" } else { "Restored" };
            println!("{state} {}", note.title);
        }
        NoteCommand::List {
            search,
            folder,
            favorites,
            recent,
            archived,
        } => {
            let document = store.read().await?;
            let filter = NoteFilter {
                search,
                folder_id: folder_filter(&document, folder.as_deref())?,
                favorites,
                recent,
                archived,
            };
            for note in filter.apply(&document, Utc::now()) {
                print_note(&document, note);
            }
        }
    }
    Ok(())
}

pub async fn process_goal_command(store: &NotesStore, command: GoalCommand) -> Result<()> {
    match command {
        GoalCommand::Add {
            title,
            description,
            priority,
            due,
            folder,
            date_style,
        } => {
            let draft = GoalDraft {
                title,
                description,
                priority,
                due_date: parse_due(due.as_deref(), date_style)?,
                folder,
            };
            let goal = store
                .update(|document| document.add_goal(draft, Utc::now()))
                .await?;
            println!("Created goal {}", goal.id);
        }
        GoalCommand::Edit {
            id,
            title,
            description,
            priority,
            due,
            folder,
            date_style,
        } => {
            let changes = GoalChanges {
                title,
                description,
                priority,
                due_date: parse_due(due.as_deref(), date_style)?,
                folder,
            };
            let goal = store
                .update(|document| document.edit_goal(&id, changes, Utc::now()))
                .await?;
            println!("Updated goal {}", goal.id);
        }
        GoalCommand::Toggle { id } => {
            let goal = store
                .update(|document| document.toggle_completed(&id, Utc::now()))
                .await?;
            let state = if goal.is_completed { "Completed" } else { "In progress" };
            println!("{state}: {}", goal.title);
        }
        GoalCommand::Delete { id } => {
            let goal = store.update(|document| document.delete_goal(&id)).await?;
            println!("Deleted goal {}", goal.title);
        }
        GoalCommand::List { search, folder } => {
            let document = store.read().await?;
            let filter = GoalFilter {
                search,
                folder_id: folder_filter(&document, folder.as_deref())?,
            };
            for goal in filter.apply(&document) {
                print_goal(&document, goal);
            }
        }
    }
    Ok(())
}

fn folder_filter(document: &NotesDocument, folder: Option<&str>) -> Result<Option<String>> {
    let Some(folder) = folder else {
        return Ok(None);
    };
    let found = document
        .find_folder(folder)
        .ok_or_else(|| NotesError::UnknownFolder(folder.to_string()))?;
    Ok(Some(found.id.to_string()))
}

fn parse_due(due: Option<&str>, date_style: DateStyle) -> Result<Option<NaiveDate>> {
    due.map(|v| parse_date(Some(v), Local::now(), date_style, "due").map(|v| v.date_naive()))
        .transpose()
}

fn folder_name<'a>(document: &'a NotesDocument, id: Option<&str>) -> &'a str {
    id.and_then(|id| document.find_folder(id))
        .map(|v| v.name.as_str())
        .unwrap_or("-")
}

fn print_folder(folder: &Folder) {
    println!("{}\t{}\t{}", folder.id, folder.color, folder.name);
}

fn print_note(document: &NotesDocument, note: &Note) {
    println!(
        "{}\t{}{}\t{}\t{}\t{}",
        note.id,
        if note.is_favorite { "* " } else { "" },
        note.title,
        folder_name(document, note.folder_id.as_deref()),
        note.tags.join(", "),
        note.updated_at.with_timezone(&Local).format("%x %H:%M")
    );
}

fn print_goal(document: &NotesDocument, goal: &Goal) {
    println!(
        "{}\t[{}] {}\t{}\t{}\t{}",
        goal.id,
        if goal.is_completed { "x" } else { " " },
        goal.title,
        goal.priority,
        goal.due_date
            .map(|v| v.format("%x").to_string())
            .unwrap_or_else(|| "-".into()),
        folder_name(document, goal.folder_id.as_deref())
    );
}
