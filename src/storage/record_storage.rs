use std::{
    future::{self, Future},
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use futures::TryStreamExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tokio_stream::wrappers::ReadDirStream;
use tracing::{debug, instrument, warn};

use crate::utils::time::{date_to_record_name, record_name_to_date};

use super::entities::{Annotation, TimeIntervalEntity};

/// Interface for abstracting storage of sessions. Sessions are grouped by the UTC day they
/// started on.
pub trait RecordStorage {
    /// Appends a finished session to the file of the day it started on.
    fn append(&self, record: TimeIntervalEntity) -> impl Future<Output = Result<()>>;

    /// Retrieves data from a record file for a certain day.
    fn get_data_for(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<TimeIntervalEntity>>> + Send;

    /// Runs `update` over all sessions of a day while holding the day exclusively, then writes
    /// the result back.
    fn update_day<T, F>(&self, date: NaiveDate, update: F) -> impl Future<Output = Result<T>>
    where
        F: FnOnce(&mut Vec<TimeIntervalEntity>) -> T;

    /// Days that have a record file, oldest first.
    fn days(&self) -> impl Future<Output = Result<Vec<NaiveDate>>>;
}

impl<T: Deref> RecordStorage for T
where
    T::Target: RecordStorage,
{
    fn append(&self, record: TimeIntervalEntity) -> impl Future<Output = Result<()>> {
        self.deref().append(record)
    }

    fn get_data_for(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<TimeIntervalEntity>>> + Send {
        self.deref().get_data_for(date)
    }

    fn update_day<R, F>(&self, date: NaiveDate, update: F) -> impl Future<Output = Result<R>>
    where
        F: FnOnce(&mut Vec<TimeIntervalEntity>) -> R,
    {
        self.deref().update_day(date, update)
    }

    fn days(&self) -> impl Future<Output = Result<Vec<NaiveDate>>> {
        self.deref().days()
    }
}

/// The main realization of [RecordStorage].
pub struct RecordStorageImpl {
    record_dir: PathBuf,
}

impl RecordStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    async fn get_all_inner(&self, path: &Path) -> Result<Vec<TimeIntervalEntity>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<TimeIntervalEntity>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut intervals = vec![];
            loop {
                match lines.next_line().await {
                    Ok(Some(v)) => {
                        if let Some(interval) = parse_record(path, &v) {
                            intervals.push(interval);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Stopped reading {path:?} early, the rest is unreadable: {e}");
                        break;
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(intervals)
        }

        match extract(path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn rewrite_with_file<T>(
        file: &mut File,
        path: &Path,
        update: impl FnOnce(&mut Vec<TimeIntervalEntity>) -> T,
    ) -> Result<T> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut records = vec![];
        // Lines that don't parse are written back untouched so they can still be fixed by hand.
        let mut kept = vec![];
        for line in content.lines() {
            match parse_record(path, line) {
                Some(record) => records.push(record),
                None if !line.trim().is_empty() => kept.push(line),
                None => {}
            }
        }

        let result = update(&mut records);

        let mut buffer = Vec::<u8>::new();
        for line in kept {
            buffer.extend_from_slice(line.as_bytes());
            buffer.push(b'\n');
        }
        buffer.extend(serialize_records(&records)?);

        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(result)
    }
}

impl RecordStorage for RecordStorageImpl {
    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn append(&self, record: TimeIntervalEntity) -> Result<()> {
        let path = self.day_path(record.start.date_naive());
        let mut file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = async {
            file.write_all(&serialize_records([&record])?).await?;
            file.flush().await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        file.unlock_async().await?;
        result
    }

    async fn get_data_for(&self, date: NaiveDate) -> Result<Vec<TimeIntervalEntity>> {
        let path = self.day_path(date);
        let data = self.get_all_inner(&path).await?;
        Ok(data)
    }

    async fn update_day<T, F>(&self, date: NaiveDate, update: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<TimeIntervalEntity>) -> T,
    {
        let path = self.day_path(date);
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&path)
            .await?;

        file.lock_exclusive()?;
        let result = Self::rewrite_with_file(&mut file, &path, update).await;
        file.unlock_async().await?;
        result
    }

    async fn days(&self) -> Result<Vec<NaiveDate>> {
        let entries = tokio::fs::read_dir(&self.record_dir).await?;
        let mut days = ReadDirStream::new(entries)
            .try_filter_map(|entry| {
                future::ready(Ok(entry.file_name().to_str().and_then(record_name_to_date)))
            })
            .try_collect::<Vec<_>>()
            .await?;
        days.sort();
        Ok(days)
    }
}

fn parse_record(path: &Path, line: &str) -> Option<TimeIntervalEntity> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<TimeIntervalEntity>(line) {
        Ok(v) if v.is_well_formed() => Some(v),
        Ok(v) => {
            warn!("Skipping session {} in {path:?} that ends before it starts", v.id);
            None
        }
        Err(e) => {
            // ignore illegal values. Might happen after a write got cut off
            warn!("During parsing in path {path:?} found illegal json string {line}: {e}");
            None
        }
    }
}

fn serialize_records<'a>(
    records: impl IntoIterator<Item = &'a TimeIntervalEntity>,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::<u8>::new();
    for record in records {
        serde_json::to_writer(&mut buffer, record)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

/// Looks a session up by its identifier, scanning the newest days first.
pub async fn find_record(
    storage: &impl RecordStorage,
    id: &str,
) -> Result<Option<TimeIntervalEntity>> {
    for day in storage.days().await?.into_iter().rev() {
        let records = storage.get_data_for(day).await?;
        if let Some(record) = records.into_iter().find(|v| &*v.id == id) {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Applies `annotation` to the session with `id`. Returns the updated session, or `None` if no
/// such session exists.
pub async fn update_record(
    storage: &impl RecordStorage,
    id: &str,
    annotation: Annotation,
) -> Result<Option<TimeIntervalEntity>> {
    let Some(record) = find_record(storage, id).await? else {
        return Ok(None);
    };
    storage
        .update_day(record.start.date_naive(), move |records| {
            let found = records.iter_mut().find(|v| &*v.id == id)?;
            annotation.apply(found);
            Some(found.clone())
        })
        .await
}

/// Removes the session with `id`. Returns whether anything was removed.
pub async fn delete_record(storage: &impl RecordStorage, id: &str) -> Result<bool> {
    let Some(record) = find_record(storage, id).await? else {
        return Ok(false);
    };
    storage
        .update_day(record.start.date_naive(), |records| {
            let before = records.len();
            records.retain(|v| &*v.id != id);
            records.len() != before
        })
        .await
}

/// Sorted, de-duplicated project names used by `records`.
pub fn distinct_projects<'a>(records: impl IntoIterator<Item = &'a TimeIntervalEntity>) -> Vec<String> {
    let mut projects = records
        .into_iter()
        .filter_map(|v| v.project.clone())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();
    projects.sort();
    projects.dedup();
    projects
}
