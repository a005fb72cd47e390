use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MILLIS_PER_HOUR: f64 = 3_600_000.;

/// One logged work session. Stored as a single json line, with `start` and `end` written as
/// RFC 3339 timestamps.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TimeIntervalEntity {
    pub id: Arc<str>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TimeIntervalEntity {
    /// Creates an unannotated session with a fresh identifier. Both instants are truncated to
    /// whole milliseconds, the resolution periods and durations work in.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string().into(),
            start: start.trunc_subsecs(3),
            end: end.trunc_subsecs(3),
            title: None,
            project: None,
            description: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration converted from milliseconds to fractional hours.
    pub fn hours(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / MILLIS_PER_HOUR
    }

    /// Zero length sessions are fine, sessions ending before they start are not.
    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }

    pub fn belongs_to(&self, project: Option<&str>) -> bool {
        match project {
            None => true,
            Some(project) => self.project.as_deref() == Some(project),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        annotation.apply(&mut self);
        self
    }

    pub fn with_id(self, id: &str) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn with_start(self, start: DateTime<Utc>) -> Self {
        Self { start, ..self }
    }

    pub fn with_end(self, end: DateTime<Utc>) -> Self {
        Self { end, ..self }
    }
}

/// Free text attached to a session. `None` leaves a field untouched, an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub title: Option<String>,
    pub project: Option<String>,
    pub description: Option<String>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.project.is_none() && self.description.is_none()
    }

    pub fn apply(self, entity: &mut TimeIntervalEntity) {
        if let Some(title) = self.title {
            entity.title = non_empty(title);
        }
        if let Some(project) = self.project {
            entity.project = non_empty(project);
        }
        if let Some(description) = self.description {
            entity.description = non_empty(description);
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The running timer. Only one can exist at a time and it outlives the process that started it.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActiveSession {
    pub session_id: Arc<str>,
    pub start: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string().into(),
            start: start.trunc_subsecs(3),
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start).max(Duration::zero())
    }

    /// Turns the running timer into a finished session ending at `end`.
    pub fn finish(self, end: DateTime<Utc>, annotation: Annotation) -> TimeIntervalEntity {
        let start = self.start.trunc_subsecs(3);
        TimeIntervalEntity {
            id: self.session_id,
            start,
            end: end.trunc_subsecs(3).max(start),
            title: None,
            project: None,
            description: None,
        }
        .with_annotation(annotation)
    }
}
