//! Incremental synchronization between the remote library and the local index
//!
//! One sync pass fetches every item changed since the indexed watermark,
//! materializes the whole delta, and commits it together with the new
//! watermark in a single index transaction. This is the only path that
//! advances `library_version`; a failed pass leaves it unchanged so the
//! next attempt naturally retries the same delta.

use chrono::Utc;

use crate::db::SearchIndex;
use crate::error::Result;
use crate::records::{Item, RawItem};
use crate::remote::ItemSource;

/// Run one synchronization pass. Returns the number of items processed.
///
/// Idempotent: with no remote changes the delta is empty and the watermark
/// stays where it was.
pub fn synchronize(source: &impl ItemSource, index: &SearchIndex) -> Result<usize> {
    let since = index.library_version()?;
    let batch = source.fetch_since(since)?;

    let items: Vec<Item> = batch.items.into_iter().map(RawItem::into_item).collect();
    let count = items.len();

    // The watermark never moves backwards, even if the source reports an
    // older version than we already hold.
    let new_version = batch.version.max(since);
    index.upsert_and_advance(&items, new_version)?;

    tracing::info!(count, version = new_version, "index updated");
    Ok(count)
}

/// Synchronize only when the configured interval has elapsed since the last
/// successful index update. Returns `None` when the index is fresh enough.
pub fn maybe_synchronize(
    source: &impl ItemSource,
    index: &SearchIndex,
    interval_secs: u64,
) -> Result<Option<usize>> {
    let elapsed = Utc::now().timestamp() - index.last_sync_epoch()?;
    if elapsed < interval_secs as i64 {
        tracing::debug!(elapsed, interval_secs, "index is fresh, skipping sync");
        return Ok(None);
    }
    tracing::info!(elapsed, "time since last sync exceeds interval, synchronizing");
    synchronize(source, index).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZotError;
    use crate::records::RawItem;
    use crate::remote::FetchedBatch;
    use tempfile::tempdir;

    /// In-memory item source with per-item versions, honoring the delta
    /// contract: `fetch_since(v)` returns items with version > v and the
    /// current max version.
    struct FakeSource {
        items: Vec<(i64, RawItem)>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self { items: Vec::new() }
        }

        fn put(&mut self, version: i64, key: &str, title: &str, extra: Option<&str>) {
            self.items.retain(|(_, it)| it.key != key);
            self.items.push((
                version,
                RawItem {
                    key: key.to_string(),
                    title: Some(title.to_string()),
                    extra: extra.map(str::to_string),
                    ..Default::default()
                },
            ));
        }

        fn max_version(&self) -> i64 {
            self.items.iter().map(|(v, _)| *v).max().unwrap_or(0)
        }
    }

    impl ItemSource for FakeSource {
        fn fetch_since(&self, since: i64) -> Result<FetchedBatch> {
            Ok(FetchedBatch {
                items: self
                    .items
                    .iter()
                    .filter(|(v, _)| *v > since)
                    .map(|(_, it)| it.clone())
                    .collect(),
                version: self.max_version(),
            })
        }
    }

    struct BrokenSource;

    impl ItemSource for BrokenSource {
        fn fetch_since(&self, _since: i64) -> Result<FetchedBatch> {
            Err(ZotError::Remote("connection reset by peer".to_string()))
        }
    }

    fn open_index(dir: &tempfile::TempDir) -> SearchIndex {
        SearchIndex::open(&dir.path().join("index.sqlite")).unwrap()
    }

    #[test]
    fn test_synchronize_indexes_delta() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);

        let mut source = FakeSource::new();
        source.put(3, "AAAAAAAA", "Deep Learning", Some("bibtex: deep2020"));
        source.put(5, "BBBBBBBB", "Shallow Water Waves", None);

        let count = synchronize(&source, &index).unwrap();
        assert_eq!(count, 2);
        assert_eq!(index.library_version().unwrap(), 5);

        let found = index.search("deep2020", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "AAAAAAAA");
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);

        let mut source = FakeSource::new();
        source.put(4, "AAAAAAAA", "Deep Learning", None);

        assert_eq!(synchronize(&source, &index).unwrap(), 1);
        let version = index.library_version().unwrap();

        assert_eq!(synchronize(&source, &index).unwrap(), 0);
        assert_eq!(index.library_version().unwrap(), version);
    }

    #[test]
    fn test_synchronize_fetches_only_newer_items() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);

        let mut source = FakeSource::new();
        source.put(2, "AAAAAAAA", "Deep Learning", None);
        synchronize(&source, &index).unwrap();

        source.put(7, "BBBBBBBB", "Shallow Water Waves", None);
        assert_eq!(synchronize(&source, &index).unwrap(), 1);
        assert_eq!(index.library_version().unwrap(), 7);
        assert_eq!(index.item_count().unwrap(), 2);
    }

    #[test]
    fn test_synchronize_replaces_changed_items() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);

        let mut source = FakeSource::new();
        source.put(2, "AAAAAAAA", "Draft Title", None);
        synchronize(&source, &index).unwrap();

        source.put(6, "AAAAAAAA", "Final Title", None);
        assert_eq!(synchronize(&source, &index).unwrap(), 1);

        assert_eq!(index.item_count().unwrap(), 1);
        assert_eq!(index.get("AAAAAAAA").unwrap().unwrap().title, "Final Title");
    }

    #[test]
    fn test_version_never_decreases() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);
        index.upsert_and_advance(&[], 10).unwrap();

        let mut source = FakeSource::new();
        source.put(2, "AAAAAAAA", "Old News", None);

        // The source reports max version 2, below our watermark.
        synchronize(&source, &index).unwrap();
        assert_eq!(index.library_version().unwrap(), 10);
    }

    #[test]
    fn test_failed_fetch_leaves_watermark() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);
        index.upsert_and_advance(&[], 10).unwrap();

        assert!(synchronize(&BrokenSource, &index).is_err());
        assert_eq!(index.library_version().unwrap(), 10);
    }

    #[test]
    fn test_maybe_synchronize_respects_interval() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir);

        let mut source = FakeSource::new();
        source.put(1, "AAAAAAAA", "Deep Learning", None);

        // Never synced: interval has trivially elapsed.
        assert_eq!(
            maybe_synchronize(&source, &index, 300).unwrap(),
            Some(1)
        );

        // Freshly synced: skipped.
        assert_eq!(maybe_synchronize(&source, &index, 300).unwrap(), None);

        // Zero interval: always syncs.
        assert_eq!(maybe_synchronize(&source, &index, 0).unwrap(), Some(0));
    }
}
