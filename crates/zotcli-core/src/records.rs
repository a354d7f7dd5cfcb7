//! Typed records shared across the index, codec, and sync layers.
//!
//! Raw remote payloads are validated into these structs at the boundary;
//! nothing downstream works with loose key/value maps.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder title for items the remote source delivers without one.
pub const UNTITLED: &str = "Untitled";

/// A bibliographic item summary cached in the local index.
///
/// `key` is assigned by the remote library and is the join key between
/// remote and local representations; it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub creator: Option<String>,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub date: Option<String>,
    pub citekey: Option<String>,
}

/// Sync bookkeeping for the local index (singleton row).
///
/// Both fields advance together at the end of a successful synchronization,
/// never one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub last_sync_epoch: i64,
    pub library_version: i64,
}

/// The editable note payload embedded in remote note HTML.
///
/// `version` is tied to the remote item's modification version; a payload
/// whose version is behind the remote note's cannot be trusted and must be
/// regenerated from the live HTML. Older clients serialized payloads without
/// a version, so it stays optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub format: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl NoteRecord {
    pub fn new(format: impl Into<String>, text: impl Into<String>, version: i64) -> Self {
        Self {
            format: format.into(),
            text: text.into(),
            version: Some(version),
        }
    }
}

/// An item record as delivered by the remote source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub key: String,
    pub creator_summary: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub date: Option<String>,
    pub extra: Option<String>,
}

impl RawItem {
    /// Validate a raw remote record into an indexable `Item`.
    pub fn into_item(self) -> Item {
        let citekey = self.extra.as_deref().and_then(extract_citekey);
        Item {
            key: self.key,
            creator: self.creator_summary,
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            abstract_text: self.abstract_text,
            date: self.date,
            citekey,
        }
    }
}

/// A note as delivered by the remote source: rendered HTML plus the library
/// version at which the note was last modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNote {
    pub key: String,
    pub html: String,
    pub version: i64,
}

static CITEKEY_PAT: OnceLock<Regex> = OnceLock::new();

/// Extract a citation key from an item's free-text `extra` field.
///
/// The key lives on its own line in the form `bibtex: <key>`; the first
/// matching line wins.
pub fn extract_citekey(extra: &str) -> Option<String> {
    let pat = CITEKEY_PAT
        .get_or_init(|| Regex::new(r"(?m)^bibtex: (.*)$").expect("citekey pattern is valid"));
    pat.captures(extra)
        .map(|caps| caps[1].trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citekey_extracted_from_own_line() {
        let extra = "PMID: 123456\nbibtex: smith2020\nOCLC: 9987";
        assert_eq!(extract_citekey(extra), Some("smith2020".to_string()));
    }

    #[test]
    fn test_citekey_absent() {
        assert_eq!(extract_citekey("PMID: 123456"), None);
        assert_eq!(extract_citekey(""), None);
    }

    #[test]
    fn test_citekey_not_matched_mid_line() {
        assert_eq!(extract_citekey("see bibtex: smith2020"), None);
    }

    #[test]
    fn test_citekey_first_line_wins() {
        let extra = "bibtex: first2019\nbibtex: second2020";
        assert_eq!(extract_citekey(extra), Some("first2019".to_string()));
    }

    #[test]
    fn test_citekey_trailing_cr_trimmed() {
        assert_eq!(
            extract_citekey("bibtex: smith2020\r\n"),
            Some("smith2020".to_string())
        );
    }

    #[test]
    fn test_into_item_defaults_title() {
        let raw = RawItem {
            key: "AAAAAAAA".into(),
            ..Default::default()
        };
        let item = raw.into_item();
        assert_eq!(item.title, UNTITLED);
        assert_eq!(item.citekey, None);
    }

    #[test]
    fn test_into_item_empty_title_defaults() {
        let raw = RawItem {
            key: "AAAAAAAA".into(),
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(raw.into_item().title, UNTITLED);
    }

    #[test]
    fn test_into_item_scans_extra() {
        let raw = RawItem {
            key: "BBBBBBBB".into(),
            title: Some("Deep Learning".into()),
            creator_summary: Some("A. Turing".into()),
            extra: Some("bibtex: turing1950".into()),
            ..Default::default()
        };
        let item = raw.into_item();
        assert_eq!(item.citekey, Some("turing1950".to_string()));
        assert_eq!(item.creator, Some("A. Turing".to_string()));
    }

    #[test]
    fn test_note_record_version_optional_on_decode() {
        let record: NoteRecord =
            serde_json::from_str(r##"{"format":"markdown","text":"# Hi"}"##).unwrap();
        assert_eq!(record.version, None);

        let stamped = NoteRecord::new("markdown", "# Hi", 4);
        let json = serde_json::to_string(&stamped).unwrap();
        assert!(json.contains("\"version\":4"));
    }
}
