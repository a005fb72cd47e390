use std::{io::ErrorKind, path::PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use super::entities::ActiveSession;

const ACTIVE_SESSION_FILE: &str = "active_session.json";

/// Persists the running timer between invocations.
pub struct ActiveSessionStore {
    path: PathBuf,
}

impl ActiveSessionStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            path: state_dir.join(ACTIVE_SESSION_FILE),
        }
    }

    /// Returns the running session. A corrupted file is discarded, the same as having no session.
    pub async fn load(&self) -> Result<Option<ActiveSession>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<ActiveSession>(&content) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("Discarding corrupted active session {:?}: {e}", self.path);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &ActiveSession) -> Result<()> {
        debug!("Saving active session {}", session.session_id);
        tokio::fs::write(&self.path, serde_json::to_vec(session)?).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() -> Result<()> {
        let dir = tempdir()?;
        let store = ActiveSessionStore::new(dir.path().to_owned());
        assert_eq!(store.load().await?, None);

        let session = ActiveSession::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
        store.save(&session).await?;
        assert_eq!(store.load().await?, Some(session));

        store.clear().await?;
        assert_eq!(store.load().await?, None);
        store.clear().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_session_discarded() -> Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join(ACTIVE_SESSION_FILE), "{not json").await?;
        let store = ActiveSessionStore::new(dir.path().to_owned());
        assert_eq!(store.load().await?, None);
        assert!(!dir.path().join(ACTIVE_SESSION_FILE).exists());
        Ok(())
    }
}
