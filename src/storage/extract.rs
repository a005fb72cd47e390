use std::{future, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures::{stream, Stream, StreamExt, TryStreamExt};
use tracing::error;

use super::{entities::TimeIntervalEntity, record_storage::RecordStorage};

/// Inclusive range of session start times to extract.
#[derive(Debug, Clone, Copy)]
pub struct ExtractConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExtractConfig {
    fn filter(&self, entity: TimeIntervalEntity) -> Option<TimeIntervalEntity> {
        (entity.start >= self.start && entity.start <= self.end).then_some(entity)
    }
}

/// Extracts [TimeIntervalEntity] that started between 2 dates. Day files are read a few at a time
/// and streamed, so large ranges don't load every file up front.
pub fn extract_between(
    storage: impl RecordStorage,
    config: ExtractConfig,
) -> impl Stream<Item = Result<TimeIntervalEntity>> {
    let storage = Arc::new(storage);
    let start = config.start;
    let end = config.end;

    let date_iteration = date_range(start.date_naive(), end.date_naive());

    let files = date_iteration
        .map(move |day| {
            let storage = storage.clone();
            async move { (day, storage.get_data_for(day).await) }
        })
        .buffered(4);

    files
        .flat_map(|(day, data)| match data {
            Ok(data) => stream::iter(data).map(Ok).boxed_local(),
            Err(e) => {
                error!("Failed to process file {day} {e}");
                stream::once(future::ready(Err(e))).boxed_local()
            }
        })
        .filter_map(move |v| future::ready(v.map(|v| config.filter(v)).transpose()))
}

/// Collects [extract_between] into a vector, failing on the first unreadable day.
pub async fn collect_between(
    storage: impl RecordStorage,
    config: ExtractConfig,
) -> Result<Vec<TimeIntervalEntity>> {
    extract_between(storage, config).try_collect().await
}

/// Sessions shown by the log listing.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub range: ExtractConfig,
    pub project: Option<String>,
}

/// Sessions matching `query`, newest first.
pub async fn load_logs(
    storage: impl RecordStorage,
    query: &LogQuery,
) -> Result<Vec<TimeIntervalEntity>> {
    let mut records = extract_between(storage, query.range)
        .try_filter(|v| future::ready(v.belongs_to(query.project.as_deref())))
        .try_collect::<Vec<_>>()
        .await?;
    records.sort_by(|a, b| b.start.cmp(&a.start));
    Ok(records)
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold(Some(start), move |current| {
        future::ready(match current {
            Some(current) if current <= end => Some((current, current.succ_opt())),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use futures::StreamExt;
    use tempfile::tempdir;

    use crate::{
        storage::{
            entities::{Annotation, TimeIntervalEntity},
            extract::{collect_between, date_range, load_logs, ExtractConfig, LogQuery},
            record_storage::{RecordStorage, RecordStorageImpl},
        },
        utils::logging::TEST_LOGGING,
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(), NaiveTime::MIN);

    #[tokio::test]
    async fn test_date_range_inclusive() {
        let start = TEST_START_DATE.date();
        let days = date_range(start, start + Duration::days(3))
            .collect::<Vec<_>>()
            .await;
        // leap year
        assert_eq!(
            days,
            vec![
                start,
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
        assert!(date_range(start, start - Duration::days(1))
            .collect::<Vec<_>>()
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_extract_between_filters_by_start() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let storage = RecordStorageImpl::new(dir.path().to_owned())?;
        let base = Utc.from_utc_datetime(&TEST_START_DATE);
        for (id, offset) in [("before", 1), ("inside", 30), ("edge", 48), ("after", 73)] {
            let start = base + Duration::hours(offset);
            storage
                .append(TimeIntervalEntity::new(start, start + Duration::hours(1)).with_id(id))
                .await?;
        }

        let records = collect_between(
            &storage,
            ExtractConfig {
                start: base + Duration::hours(2),
                end: base + Duration::hours(48),
            },
        )
        .await?;

        let ids = records.iter().map(|v| &*v.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["inside", "edge"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_logs_newest_first_by_project() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStorageImpl::new(dir.path().to_owned())?;
        let base = Utc.from_utc_datetime(&TEST_START_DATE);
        for (id, offset, project) in [("a", 1, "web"), ("b", 26, "api"), ("c", 50, "web")] {
            let start = base + Duration::hours(offset);
            let annotation = Annotation {
                project: Some(project.into()),
                ..Default::default()
            };
            storage
                .append(
                    TimeIntervalEntity::new(start, start + Duration::hours(1))
                        .with_id(id)
                        .with_annotation(annotation),
                )
                .await?;
        }

        let query = LogQuery {
            range: ExtractConfig {
                start: base,
                end: base + Duration::days(3),
            },
            project: Some("web".into()),
        };
        let records = load_logs(&storage, &query).await?;

        let ids = records.iter().map(|v| &*v.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["c", "a"]);
        Ok(())
    }
}
