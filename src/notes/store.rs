use std::path::PathBuf;

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, instrument};

use super::entities::{NotesDocument, NotesError};

const NOTES_FILE: &str = "notes.json";

/// Persists [NotesDocument] as a single json file.
pub struct NotesStore {
    path: PathBuf,
}

impl NotesStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            path: state_dir.join(NOTES_FILE),
        }
    }

    /// Reads the document. A missing file is an empty document.
    pub async fn read(&self) -> Result<NotesDocument> {
        let mut file = match File::open(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(NotesDocument::default())
            }
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let result = read_document(&mut file).await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to read notes from {:?}", self.path))
    }

    /// Runs `update` over the document while holding it exclusively. Nothing is written when
    /// `update` fails.
    #[instrument(skip(self, update))]
    pub async fn update<T>(
        &self,
        update: impl FnOnce(&mut NotesDocument) -> Result<T, NotesError>,
    ) -> Result<T> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        file.lock_exclusive()?;
        let result = async {
            let mut document = read_document(&mut file).await?;
            let value = update(&mut document)?;

            file.set_len(0).await?;
            file.rewind().await?;
            file.write_all(&serde_json::to_vec_pretty(&document)?).await?;
            file.flush().await?;
            debug!("Saved notes document");
            Ok::<_, anyhow::Error>(value)
        }
        .await;
        file.unlock_async().await?;
        result
    }
}

async fn read_document(file: &mut File) -> Result<NotesDocument> {
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    if content.trim().is_empty() {
        return Ok(NotesDocument::default());
    }
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::Utc;
    use tempfile::tempdir;

    use crate::notes::{
        entities::{NoteDraft, NotesError},
        store::NotesStore,
    };

    #[tokio::test]
    async fn test_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = NotesStore::new(dir.path().to_path_buf());
        let document = store.read().await?;
        assert!(document.notes.is_empty() && document.folders.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_persists() -> Result<()> {
        let dir = tempdir()?;
        let store = NotesStore::new(dir.path().to_path_buf());

        let folder = store
            .update(|document| document.add_folder("Work", None, Utc::now()))
            .await?;
        let note = store
            .update(|document| {
                document.add_note(
                    NoteDraft {
                        title: "Plan".into(),
                        folder: Some(folder.id.to_string()),
                        ..Default::default()
                    },
                    Utc::now(),
                )
            })
            .await?;

        let document = NotesStore::new(dir.path().to_path_buf()).read().await?;
        assert_eq!(document.folders, vec![folder]);
        assert_eq!(document.notes, vec![note]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() -> Result<()> {
        let dir = tempdir()?;
        let store = NotesStore::new(dir.path().to_path_buf());
        store
            .update(|document| document.add_folder("Work", None, Utc::now()))
            .await?;
        let before = store.read().await?;

        let error = store
            .update(|document| {
                document.add_folder("Other", None, Utc::now())?;
                document.delete_note("missing")
            })
            .await
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<NotesError>(),
            Some(&NotesError::NotFound("missing".into()))
        );
        assert_eq!(store.read().await?, before);
        Ok(())
    }
}
