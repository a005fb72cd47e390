use chrono::{DateTime, Duration, Utc};

use super::entities::{Goal, Note, NotesDocument};

/// Notes updated within this window count as recent.
pub const RECENT_WINDOW: Duration = Duration::days(3);

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// Case insensitive match against title, content and tags.
    pub search: Option<String>,
    pub folder_id: Option<String>,
    pub favorites: bool,
    pub recent: bool,
    /// Lists archived notes instead of the active ones.
    pub archived: bool,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note, now: DateTime<Utc>) -> bool {
        if note.is_archived != self.archived {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            let found = note.title.to_lowercase().contains(&search)
                || note.content.to_lowercase().contains(&search)
                || note.tags.iter().any(|v| v.to_lowercase().contains(&search));
            if !found {
                return false;
            }
        }
        if let Some(folder_id) = &self.folder_id {
            if note.folder_id.as_deref() != Some(folder_id.as_str()) {
                return false;
            }
        }
        if self.favorites && !note.is_favorite {
            return false;
        }
        if self.recent && note.updated_at < now - RECENT_WINDOW {
            return false;
        }
        true
    }

    /// Matching notes, most recently updated first.
    pub fn apply<'a>(&self, document: &'a NotesDocument, now: DateTime<Utc>) -> Vec<&'a Note> {
        let mut notes = document
            .notes
            .iter()
            .filter(|v| self.matches(v, now))
            .collect::<Vec<_>>();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    /// Case insensitive match against title and description.
    pub search: Option<String>,
    pub folder_id: Option<String>,
}

impl GoalFilter {
    pub fn matches(&self, goal: &Goal) -> bool {
        if let Some(folder_id) = &self.folder_id {
            if goal.folder_id.as_deref() != Some(folder_id.as_str()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(search) => {
                goal.title.to_lowercase().contains(&search)
                    || goal
                        .description
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&search))
            }
            None => true,
        }
    }

    /// Matching goals, newest first.
    pub fn apply<'a>(&self, document: &'a NotesDocument) -> Vec<&'a Goal> {
        let mut goals = document
            .goals
            .iter()
            .filter(|v| self.matches(v))
            .collect::<Vec<_>>();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        goals
    }
}
