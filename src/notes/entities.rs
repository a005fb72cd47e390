use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_FOLDER_COLOR: &str = "#3B82F6";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotesError {
    #[error("Title can't be empty")]
    EmptyTitle,
    #[error("Folder name can't be empty")]
    EmptyFolderName,
    #[error("Folder {0} doesn't exist")]
    UnknownFolder(String),
    #[error("Nothing found with id {0}")]
    NotFound(String),
    #[error("{0} is not a #RRGGBB color")]
    InvalidColor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Arc<str>,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Arc<str>,
    #[serde(default)]
    pub folder_id: Option<Arc<str>>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Arc<str>,
    #[serde(default)]
    pub folder_id: Option<Arc<str>>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new note. `tags` is the raw comma separated input.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub folder: Option<String>,
}

/// Partial update of a note. `None` keeps a field, an empty `folder` moves the note out of its
/// folder.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub folder: Option<String>,
}

/// Partial update of a goal. An empty `description` or `folder` clears it.
#[derive(Debug, Clone, Default)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub folder: Option<String>,
}

/// Everything persisted by the notes store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesDocument {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl NotesDocument {
    pub fn add_folder(
        &mut self,
        name: &str,
        color: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Folder, NotesError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NotesError::EmptyFolderName);
        }
        let color = match color {
            Some(v) => parse_color(v)?,
            None => DEFAULT_FOLDER_COLOR.to_string(),
        };
        let folder = Folder {
            id: new_id(),
            name: name.to_string(),
            color,
            created_at: now,
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    /// Folders, oldest first.
    pub fn folders(&self) -> Vec<&Folder> {
        let mut folders = self.folders.iter().collect::<Vec<_>>();
        folders.sort_by_key(|v| v.created_at);
        folders
    }

    /// Looks a folder up by id, falling back to its name.
    pub fn find_folder(&self, reference: &str) -> Option<&Folder> {
        let reference = reference.trim();
        self.folders
            .iter()
            .find(|v| &*v.id == reference)
            .or_else(|| self.folders.iter().find(|v| v.name == reference))
    }

    pub fn add_note(&mut self, draft: NoteDraft, now: DateTime<Utc>) -> Result<Note, NotesError> {
        let note = Note {
            id: new_id(),
            folder_id: self.resolve_folder(draft.folder.as_deref())?,
            title: required_title(&draft.title)?,
            content: draft.content.trim().to_string(),
            tags: parse_tags(&draft.tags),
            is_favorite: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        self.notes.push(note.clone());
        Ok(note)
    }

    pub fn edit_note(
        &mut self,
        id: &str,
        changes: NoteChanges,
        now: DateTime<Utc>,
    ) -> Result<Note, NotesError> {
        let folder_id = match changes.folder.as_deref() {
            Some(folder) => Some(self.resolve_folder(Some(folder))?),
            None => None,
        };
        let title = changes.title.as_deref().map(required_title).transpose()?;

        let note = self.note_mut(id)?;
        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = content.trim().to_string();
        }
        if let Some(tags) = changes.tags {
            note.tags = parse_tags(&tags);
        }
        if let Some(folder_id) = folder_id {
            note.folder_id = folder_id;
        }
        note.updated_at = now;
        Ok(note.clone())
    }

    pub fn toggle_favorite(&mut self, id: &str, now: DateTime<Utc>) -> Result<Note, NotesError> {
        let note = self.note_mut(id)?;
        note.is_favorite = !note.is_favorite;
        note.updated_at = now;
        Ok(note.clone())
    }

    pub fn toggle_archived(&mut self, id: &str, now: DateTime<Utc>) -> Result<Note, NotesError> {
        let note = self.note_mut(id)?;
        note.is_archived = !note.is_archived;
        note.updated_at = now;
        Ok(note.clone())
    }

    pub fn delete_note(&mut self, id: &str) -> Result<Note, NotesError> {
        let index = self
            .notes
            .iter()
            .position(|v| &*v.id == id)
            .ok_or_else(|| NotesError::NotFound(id.to_string()))?;
        Ok(self.notes.remove(index))
    }

    pub fn add_goal(&mut self, draft: GoalDraft, now: DateTime<Utc>) -> Result<Goal, NotesError> {
        let goal = Goal {
            id: new_id(),
            folder_id: self.resolve_folder(draft.folder.as_deref())?,
            title: required_title(&draft.title)?,
            description: draft.description.and_then(non_empty),
            priority: draft.priority,
            due_date: draft.due_date,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        self.goals.push(goal.clone());
        Ok(goal)
    }

    pub fn edit_goal(
        &mut self,
        id: &str,
        changes: GoalChanges,
        now: DateTime<Utc>,
    ) -> Result<Goal, NotesError> {
        let folder_id = match changes.folder.as_deref() {
            Some(folder) => Some(self.resolve_folder(Some(folder))?),
            None => None,
        };
        let title = changes.title.as_deref().map(required_title).transpose()?;

        let goal = self.goal_mut(id)?;
        if let Some(title) = title {
            goal.title = title;
        }
        if let Some(description) = changes.description {
            goal.description = non_empty(description);
        }
        if let Some(priority) = changes.priority {
            goal.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            goal.due_date = Some(due_date);
        }
        if let Some(folder_id) = folder_id {
            goal.folder_id = folder_id;
        }
        goal.updated_at = now;
        Ok(goal.clone())
    }

    pub fn toggle_completed(&mut self, id: &str, now: DateTime<Utc>) -> Result<Goal, NotesError> {
        let goal = self.goal_mut(id)?;
        goal.is_completed = !goal.is_completed;
        goal.updated_at = now;
        Ok(goal.clone())
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<Goal, NotesError> {
        let index = self
            .goals
            .iter()
            .position(|v| &*v.id == id)
            .ok_or_else(|| NotesError::NotFound(id.to_string()))?;
        Ok(self.goals.remove(index))
    }

    /// Maps user input onto a folder id. Folders can be referenced by id or by name, an empty
    /// reference means no folder.
    fn resolve_folder(&self, folder: Option<&str>) -> Result<Option<Arc<str>>, NotesError> {
        let Some(folder) = folder.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        self.find_folder(folder)
            .map(|v| Some(v.id.clone()))
            .ok_or_else(|| NotesError::UnknownFolder(folder.to_string()))
    }

    fn note_mut(&mut self, id: &str) -> Result<&mut Note, NotesError> {
        self.notes
            .iter_mut()
            .find(|v| &*v.id == id)
            .ok_or_else(|| NotesError::NotFound(id.to_string()))
    }

    fn goal_mut(&mut self, id: &str) -> Result<&mut Goal, NotesError> {
        self.goals
            .iter_mut()
            .find(|v| &*v.id == id)
            .ok_or_else(|| NotesError::NotFound(id.to_string()))
    }
}

fn new_id() -> Arc<str> {
    Uuid::new_v4().to_string().into()
}

fn required_title(title: &str) -> Result<String, NotesError> {
    non_empty(title.to_string()).ok_or(NotesError::EmptyTitle)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Splits comma separated tags, dropping empty ones.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_color(color: &str) -> Result<String, NotesError> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|v| v.is_ascii_hexdigit());
    if valid {
        Ok(color.to_uppercase())
    } else {
        Err(NotesError::InvalidColor(color.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_folder_colors() {
        let mut document = NotesDocument::default();
        let folder = document.add_folder(" Work ", None, now()).unwrap();
        assert_eq!(folder.name, "Work");
        assert_eq!(folder.color, DEFAULT_FOLDER_COLOR);

        let folder = document.add_folder("Home", Some("#10b981"), now()).unwrap();
        assert_eq!(folder.color, "#10B981");

        assert_eq!(
            document.add_folder("Bad", Some("red"), now()),
            Err(NotesError::InvalidColor("red".into()))
        );
        assert_eq!(
            document.add_folder("  ", None, now()),
            Err(NotesError::EmptyFolderName)
        );
    }

    #[test]
    fn test_folders_oldest_first() {
        let mut document = NotesDocument::default();
        document.add_folder("b", None, now()).unwrap();
        document
            .add_folder("a", None, now() - Duration::days(1))
            .unwrap();
        let names = document
            .folders()
            .into_iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_add_note() {
        let mut document = NotesDocument::default();
        let folder = document.add_folder("Work", None, now()).unwrap();
        let note = document
            .add_note(
                NoteDraft {
                    title: " Plan ".into(),
                    content: "ship it".into(),
                    tags: "rust, ,cli ,".into(),
                    folder: Some("Work".into()),
                },
                now(),
            )
            .unwrap();

        assert_eq!(note.title, "Plan");
        assert_eq!(note.tags, vec!["rust", "cli"]);
        assert_eq!(note.folder_id, Some(folder.id));
        assert!(!note.is_favorite && !note.is_archived);
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_note_rejections() {
        let mut document = NotesDocument::default();
        assert_eq!(
            document.add_note(
                NoteDraft {
                    title: "   ".into(),
                    ..Default::default()
                },
                now()
            ),
            Err(NotesError::EmptyTitle)
        );
        assert_eq!(
            document.add_note(
                NoteDraft {
                    title: "x".into(),
                    folder: Some("missing".into()),
                    ..Default::default()
                },
                now()
            ),
            Err(NotesError::UnknownFolder("missing".into()))
        );
        assert_eq!(
            document.toggle_favorite("missing", now()),
            Err(NotesError::NotFound("missing".into()))
        );
        assert!(document.notes.is_empty());
    }

    #[test]
    fn test_edit_and_toggle_note() {
        let mut document = NotesDocument::default();
        let note = document
            .add_note(
                NoteDraft {
                    title: "Plan".into(),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();

        let later = now() + Duration::hours(1);
        let edited = document
            .edit_note(
                &note.id,
                NoteChanges {
                    content: Some("details".into()),
                    tags: Some("a,b".into()),
                    ..Default::default()
                },
                later,
            )
            .unwrap();
        assert_eq!(edited.title, "Plan");
        assert_eq!(edited.content, "details");
        assert_eq!(edited.tags, vec!["a", "b"]);
        assert_eq!(edited.updated_at, later);

        assert!(document.toggle_favorite(&note.id, later).unwrap().is_favorite);
        assert!(!document.toggle_favorite(&note.id, later).unwrap().is_favorite);
        assert!(document.toggle_archived(&note.id, later).unwrap().is_archived);

        assert_eq!(
            document.edit_note(
                &note.id,
                NoteChanges {
                    title: Some("".into()),
                    ..Default::default()
                },
                later
            ),
            Err(NotesError::EmptyTitle)
        );

        document.delete_note(&note.id).unwrap();
        assert!(document.notes.is_empty());
    }

    #[test]
    fn test_goals() {
        let mut document = NotesDocument::default();
        let goal = document
            .add_goal(
                GoalDraft {
                    title: "Learn".into(),
                    description: Some("  ".into()),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(goal.priority, Priority::Medium);
        assert_eq!(goal.description, None);

        let edited = document
            .edit_goal(
                &goal.id,
                GoalChanges {
                    priority: Some(Priority::High),
                    description: Some("every day".into()),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(edited.priority, Priority::High);
        assert_eq!(edited.description.as_deref(), Some("every day"));

        assert!(document.toggle_completed(&goal.id, now()).unwrap().is_completed);
        document.delete_goal(&goal.id).unwrap();
        assert_eq!(
            document.delete_goal(&goal.id),
            Err(NotesError::NotFound(goal.id.to_string()))
        );
    }
}
