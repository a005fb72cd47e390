use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    storage::{
        active_session::ActiveSessionStore,
        entities::{ActiveSession, Annotation, TimeIntervalEntity},
        record_storage::RecordStorage,
    },
    utils::clock::Clock,
};

const WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    #[error("A session is already running since {0}")]
    AlreadyRunning(DateTime<Utc>),
    #[error("No session is running")]
    NotRunning,
    #[error("Session can't end at {end} before it starts at {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    pub session: ActiveSession,
    pub elapsed: chrono::Duration,
}

/// Bridges the persisted [ActiveSession] and [RecordStorage]. At most one session runs at a time.
pub struct Timer<R: RecordStorage> {
    records: R,
    active: ActiveSessionStore,
    clock: Box<dyn Clock>,
}

impl<R: RecordStorage> Timer<R> {
    pub fn new(records: R, active: ActiveSessionStore, clock: Box<dyn Clock>) -> Self {
        Self {
            records,
            active,
            clock,
        }
    }

    pub async fn start(&self) -> Result<ActiveSession> {
        if let Some(running) = self.active.load().await? {
            return Err(TimerError::AlreadyRunning(running.start).into());
        }
        let session = ActiveSession::new(self.clock.now());
        self.active.save(&session).await?;
        info!("Started session {}", session.session_id);
        Ok(session)
    }

    /// Stores the running session with `annotation` and clears it.
    pub async fn stop(&self, annotation: Annotation) -> Result<TimeIntervalEntity> {
        let Some(running) = self.active.load().await? else {
            return Err(TimerError::NotRunning.into());
        };
        let record = running.finish(self.clock.now(), annotation);
        self.records.append(record.clone()).await?;
        self.active.clear().await?;
        info!("Stopped session {} after {}", record.id, record.duration());
        Ok(record)
    }

    pub async fn status(&self) -> Result<Option<TimerStatus>> {
        let now = self.clock.now();
        Ok(self.active.load().await?.map(|session| TimerStatus {
            elapsed: session.elapsed(now),
            session,
        }))
    }

    /// Stores a finished session that was never timed.
    pub async fn add_manual(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        annotation: Annotation,
    ) -> Result<TimeIntervalEntity> {
        if start > end {
            return Err(TimerError::InvalidInterval { start, end }.into());
        }
        let record = TimeIntervalEntity::new(start, end).with_annotation(annotation);
        debug!("Adding manual session {:?}", record);
        self.records.append(record.clone()).await?;
        Ok(record)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// Calls `on_tick` with the time elapsed since `start` once per second until `shutdown` is
/// cancelled. The first tick happens immediately.
pub async fn watch_elapsed(
    clock: &dyn Clock,
    start: DateTime<Utc>,
    shutdown: CancellationToken,
    mut on_tick: impl FnMut(chrono::Duration),
) {
    loop {
        on_tick((clock.now() - start).max(chrono::Duration::zero()));

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                return
            }
            _ = clock.sleep(WATCH_INTERVAL) => ()
        }
    }
}
