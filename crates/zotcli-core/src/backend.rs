//! High-level service tying the remote source, local index, and note
//! translator together
//!
//! All collaborators are passed in at construction; there is no ambient
//! state. The push paths guarantee the user's markup is never lost: when a
//! remote write fails after the HTML has been generated, the markup is
//! written to a recovery file before the error surfaces.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::convert::PandocConverter;
use crate::db::SearchIndex;
use crate::error::{Result, ZotError};
use crate::records::{Item, NoteRecord, RawNote};
use crate::remote::{ItemSource, NoteStore, ZoteroApi};
use crate::sync;
use crate::translate::{MarkupConverter, NoteTranslator};

/// Default recovery location for markup that failed to push.
pub const RECOVERY_FILE: &str = "note_backup.txt";

pub struct Backend<S, C> {
    source: S,
    index: SearchIndex,
    translator: NoteTranslator<C>,
    sync_interval: u64,
    recovery_path: PathBuf,
}

impl Backend<ZoteroApi, PandocConverter> {
    /// Build the standard backend from configuration: Zotero Web API source,
    /// pandoc conversion, index at the configured path (or an explicit one).
    pub fn from_config(config: &Config, index_path: Option<&Path>) -> Result<Self> {
        let source = ZoteroApi::from_config(config)?;
        let index = match index_path {
            Some(path) => SearchIndex::open(path)?,
            None => SearchIndex::open(&config.resolve_index_path()?)?,
        };
        Ok(Self::new(source, index, PandocConverter::new(), config))
    }
}

impl<S, C> Backend<S, C> {
    pub fn new(source: S, index: SearchIndex, converter: C, config: &Config) -> Self
    where
        C: MarkupConverter,
    {
        Self {
            source,
            index,
            translator: NoteTranslator::new(converter, config.note_format.clone()),
            sync_interval: config.sync_interval,
            recovery_path: PathBuf::from(RECOVERY_FILE),
        }
    }

    /// Redirect the push-failure recovery file.
    pub fn with_recovery_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.recovery_path = path.into();
        self
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Search the local index.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Item>> {
        self.index.search(query, limit)
    }

    /// Write markup to the recovery file and surface the push failure.
    fn recover_markup(&self, text: &str, err: ZotError) -> ZotError {
        if let Err(write_err) = fs::write(&self.recovery_path, text) {
            tracing::error!(
                path = %self.recovery_path.display(),
                error = %write_err,
                "failed to write recovery file; markup only survives in this log"
            );
            tracing::error!(markup = %text, "unsaved note markup");
        } else {
            tracing::warn!(
                path = %self.recovery_path.display(),
                "could not upload note; the markup was saved locally"
            );
        }
        ZotError::RemotePush {
            reason: err.to_string(),
        }
    }
}

impl<S: ItemSource, C> Backend<S, C> {
    /// Update the local index to the latest library version.
    pub fn synchronize(&self) -> Result<usize> {
        sync::synchronize(&self.source, &self.index)
    }

    /// Synchronize only when the configured interval has elapsed.
    pub fn maybe_synchronize(&self) -> Result<Option<usize>> {
        sync::maybe_synchronize(&self.source, &self.index, self.sync_interval)
    }
}

impl<S: NoteStore, C: MarkupConverter> Backend<S, C> {
    /// Fetch an item's notes as editable markup records, paired with the raw
    /// remote notes they came from.
    pub fn notes(&self, item_key: &str) -> Result<Vec<(RawNote, NoteRecord)>> {
        let notes = self.source.child_notes(item_key)?;
        notes
            .into_iter()
            .map(|note| {
                let record = self.translator.to_editable(&note)?;
                Ok((note, record))
            })
            .collect()
    }

    /// Create a new note for an item from markup text.
    pub fn create_note(&self, item_key: &str, text: &str, format: &str) -> Result<()> {
        // The server assigns the real version on create; stamp past the
        // current watermark so the payload is still trusted on next read.
        let version = self.index.library_version()? + 2;
        let record = NoteRecord::new(format, text, version);
        let html = self.translator.to_remote_html(&record)?;

        self.source
            .create_note(item_key, &html)
            .map_err(|e| self.recover_markup(&record.text, e))
    }

    /// Push an edited note back to the remote library.
    pub fn save_note(&self, note: &RawNote, record: &mut NoteRecord) -> Result<()> {
        let html = self.translator.bump_and_serialize(record)?;
        self.source
            .update_note(note, &html)
            .map_err(|e| self.recover_markup(&record.text, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct EchoConverter;

    impl MarkupConverter for EchoConverter {
        fn convert(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    /// Note store that records pushes, or refuses them.
    struct FakeStore {
        pushed: RefCell<Vec<String>>,
        fail: bool,
    }

    impl FakeStore {
        fn new(fail: bool) -> Self {
            Self {
                pushed: RefCell::new(Vec::new()),
                fail,
            }
        }
    }

    impl NoteStore for FakeStore {
        fn child_notes(&self, _item_key: &str) -> Result<Vec<RawNote>> {
            let record = NoteRecord::new("markdown", "stored *markup*", 4);
            let html = codec::embed("<p>rendered</p>", &record)?;
            Ok(vec![RawNote {
                key: "NOTE0001".to_string(),
                html,
                version: 4,
            }])
        }

        fn create_note(&self, _item_key: &str, html: &str) -> Result<()> {
            if self.fail {
                return Err(ZotError::RemotePush {
                    reason: "HTTP 503 from items".to_string(),
                });
            }
            self.pushed.borrow_mut().push(html.to_string());
            Ok(())
        }

        fn update_note(&self, _note: &RawNote, html: &str) -> Result<()> {
            self.create_note("", html)
        }
    }

    fn backend(store: FakeStore, dir: &tempfile::TempDir) -> Backend<FakeStore, EchoConverter> {
        let index = SearchIndex::open(&dir.path().join("index.sqlite")).unwrap();
        Backend::new(store, index, EchoConverter, &Config::default())
            .with_recovery_path(dir.path().join("note_backup.txt"))
    }

    #[test]
    fn test_notes_restores_markup() {
        let dir = tempdir().unwrap();
        let backend = backend(FakeStore::new(false), &dir);

        let notes = backend.notes("ITEM0001").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].1.text, "stored *markup*");
        assert_eq!(notes[0].1.version, Some(4));
    }

    #[test]
    fn test_create_note_embeds_payload() {
        let dir = tempdir().unwrap();
        let backend = backend(FakeStore::new(false), &dir);

        backend
            .create_note("ITEM0001", "# Fresh note", "markdown")
            .unwrap();

        let pushed = backend.source.pushed.borrow();
        let (payload, _) = codec::extract(&pushed[0]);
        let payload = payload.unwrap();
        assert_eq!(payload.text, "# Fresh note");
        assert_eq!(payload.version, Some(2));
        assert!(!dir.path().join("note_backup.txt").exists());
    }

    #[test]
    fn test_save_note_bumps_version() {
        let dir = tempdir().unwrap();
        let backend = backend(FakeStore::new(false), &dir);

        let note = RawNote {
            key: "NOTE0001".to_string(),
            html: String::new(),
            version: 4,
        };
        let mut record = NoteRecord::new("markdown", "edited", 4);
        backend.save_note(&note, &mut record).unwrap();

        assert_eq!(record.version, Some(5));
        let pushed = backend.source.pushed.borrow();
        let (payload, _) = codec::extract(&pushed[0]);
        assert_eq!(payload.unwrap().version, Some(5));
    }

    #[test]
    fn test_failed_push_writes_recovery_file() {
        let dir = tempdir().unwrap();
        let backend = backend(FakeStore::new(true), &dir);

        let err = backend
            .create_note("ITEM0001", "precious markup", "markdown")
            .unwrap_err();
        assert!(matches!(err, ZotError::RemotePush { .. }));

        let saved = fs::read_to_string(dir.path().join("note_backup.txt")).unwrap();
        assert_eq!(saved, "precious markup");
    }

    #[test]
    fn test_failed_update_keeps_markup_and_error() {
        let dir = tempdir().unwrap();
        let backend = backend(FakeStore::new(true), &dir);

        let note = RawNote {
            key: "NOTE0001".to_string(),
            html: String::new(),
            version: 4,
        };
        let mut record = NoteRecord::new("markdown", "edited markup", 4);
        let err = backend.save_note(&note, &mut record).unwrap_err();

        assert!(matches!(err, ZotError::RemotePush { .. }));
        assert_eq!(record.text, "edited markup");
        let saved = fs::read_to_string(dir.path().join("note_backup.txt")).unwrap();
        assert_eq!(saved, "edited markup");
    }
}
