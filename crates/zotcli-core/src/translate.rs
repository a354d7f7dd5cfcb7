//! Bridges remote note HTML and the locally edited markup representation.
//!
//! Reading a note restores the user's original markup from the hidden
//! payload when it is still current; otherwise the markup is regenerated
//! from the live HTML. Writing a note renders the markup to HTML and embeds
//! the full record, so the payload stays the sole source of truth for what
//! the user actually typed.

use crate::codec;
use crate::error::Result;
use crate::records::{NoteRecord, RawNote};

/// External markup-conversion capability (e.g. pandoc). Used in both
/// directions: markup to HTML and HTML back to markup.
pub trait MarkupConverter {
    fn convert(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

pub struct NoteTranslator<C> {
    converter: C,
    default_format: String,
}

impl<C: MarkupConverter> NoteTranslator<C> {
    pub fn new(converter: C, default_format: impl Into<String>) -> Self {
        Self {
            converter,
            default_format: default_format.into(),
        }
    }

    /// Convert a remote note into its editable markup record.
    ///
    /// The embedded payload is trusted only while its version is current.
    /// A payload older than the remote note means the note was edited
    /// through another channel since this client last touched it; the
    /// markup is then regenerated from the live HTML (with the stale
    /// fragment already stripped), never from the stale payload.
    pub fn to_editable(&self, note: &RawNote) -> Result<NoteRecord> {
        let (payload, html) = codec::extract(&note.html);

        if let Some(mut record) = payload {
            // Payloads from older clients carry no version; the remote
            // version is the best available stamp.
            if record.version.is_none() {
                record.version = Some(note.version);
            }
            match record.version {
                Some(v) if v < note.version => {
                    tracing::info!(
                        key = %note.key,
                        embedded = v,
                        remote = note.version,
                        "note changed on server, regenerating markup"
                    );
                    self.regenerate(&html, record.format, note.version)
                }
                _ => Ok(record),
            }
        } else {
            self.regenerate(&html, self.default_format.clone(), note.version)
        }
    }

    fn regenerate(&self, html: &str, format: String, version: i64) -> Result<NoteRecord> {
        let text = self.converter.convert(html, "html", &format)?;
        Ok(NoteRecord {
            format,
            text,
            version: Some(version),
        })
    }

    /// Render a record to remote HTML with the record embedded as the
    /// hidden payload. The visible HTML is a rendering, never hand-diffed.
    pub fn to_remote_html(&self, record: &NoteRecord) -> Result<String> {
        let html = self
            .converter
            .convert(&record.text, &record.format, "html")?;
        codec::embed(&html, record)
    }

    /// Advance the record's version by exactly one and render it.
    ///
    /// A local edit causally follows the last known version; the bump must
    /// happen exactly once per push, before re-embedding, or repeated
    /// pushes would collide on the same version number.
    pub fn bump_and_serialize(&self, record: &mut NoteRecord) -> Result<String> {
        record.version = Some(record.version.unwrap_or(0) + 1);
        self.to_remote_html(record)
    }
}
