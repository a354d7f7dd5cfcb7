//! Zotero Web API item source
//!
//! A thin synchronous client; authentication is a static API key header.
//! Timeouts live here, not in the sync coordinator - a failed fetch simply
//! propagates and no index state changes.

use std::time::Duration;

use serde::Deserialize;

use crate::config::{Config, LibraryType};
use crate::error::{Result, ZotError};
use crate::records::{RawItem, RawNote};

const API_BASE: &str = "https://api.zotero.org";
const API_VERSION: &str = "3";
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully drained delta fetch: every changed item plus the library version
/// the server reported while serving it. Pagination is exhausted before the
/// batch is returned, so a partial fetch can never turn into a partial
/// commit downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBatch {
    pub items: Vec<RawItem>,
    pub version: i64,
}

/// A source of versioned item records (server-side delta query).
pub trait ItemSource {
    fn fetch_since(&self, since: i64) -> Result<FetchedBatch>;
}

/// Remote note storage for the push/pull paths.
pub trait NoteStore {
    fn child_notes(&self, item_key: &str) -> Result<Vec<RawNote>>;
    fn create_note(&self, item_key: &str, html: &str) -> Result<()>;
    fn update_note(&self, note: &RawNote, html: &str) -> Result<()>;
}

/// Synchronous Zotero Web API client.
#[derive(Debug)]
pub struct ZoteroApi {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    library_prefix: String,
}

impl ZoteroApi {
    pub fn new(api_key: &str, library_id: &str, library_type: LibraryType) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: API_BASE.to_string(),
            api_key: api_key.to_string(),
            library_prefix: format!("{}/{}", library_type.api_prefix(), library_id),
        }
    }

    /// Build a client from configuration; fails fast when credentials are
    /// missing, before any request goes out.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (api_key, library_id) = config.credentials()?;
        Ok(Self::new(api_key, library_id, config.library_type))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.library_prefix, path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ureq::Response> {
        let mut request = self
            .agent
            .get(&self.url(path))
            .set("Zotero-API-Key", &self.api_key)
            .set("Zotero-API-Version", API_VERSION);
        for (name, value) in query {
            request = request.query(name, value);
        }
        request.call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                ZotError::Remote(format!("HTTP {} from {}", code, path))
            }
            ureq::Error::Transport(t) => ZotError::Remote(t.to_string()),
        })
    }

    fn fetch_page(&self, since: i64, start: usize) -> Result<(Vec<ApiItem>, i64, Option<usize>)> {
        let response = self.get(
            "items/top",
            &[
                ("format", "json".to_string()),
                ("since", since.to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("start", start.to_string()),
            ],
        )?;

        let version = response
            .header("Last-Modified-Version")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let total = response
            .header("Total-Results")
            .and_then(|v| v.parse().ok());
        let page: Vec<ApiItem> = response
            .into_json()
            .map_err(|e| ZotError::Remote(format!("invalid item payload: {}", e)))?;

        Ok((page, version, total))
    }
}

impl ItemSource for ZoteroApi {
    fn fetch_since(&self, since: i64) -> Result<FetchedBatch> {
        let mut items = Vec::new();
        let mut version = 0;

        loop {
            let (page, page_version, total) = self.fetch_page(since, items.len())?;
            if page_version > 0 {
                version = page_version;
            }
            let fetched = page.len();
            items.extend(page.into_iter().map(ApiItem::into_raw));

            let more = matches!(total, Some(t) if items.len() < t) && fetched > 0;
            if !more {
                break;
            }
        }

        tracing::debug!(count = items.len(), version, since, "fetched remote delta");
        Ok(FetchedBatch { items, version })
    }
}

impl NoteStore for ZoteroApi {
    fn child_notes(&self, item_key: &str) -> Result<Vec<RawNote>> {
        let response = self.get(
            &format!("items/{}/children", item_key),
            &[
                ("format", "json".to_string()),
                ("itemType", "note".to_string()),
            ],
        )?;
        let children: Vec<ApiItem> = response
            .into_json()
            .map_err(|e| ZotError::Remote(format!("invalid note payload: {}", e)))?;

        Ok(children
            .into_iter()
            .filter_map(|child| {
                let version = child.version;
                let key = child.key;
                child.data.note.map(|html| RawNote { key, html, version })
            })
            .collect())
    }

    fn create_note(&self, item_key: &str, html: &str) -> Result<()> {
        let payload = serde_json::json!([{
            "itemType": "note",
            "parentItem": item_key,
            "note": html,
        }]);
        self.agent
            .post(&self.url("items"))
            .set("Zotero-API-Key", &self.api_key)
            .set("Zotero-API-Version", API_VERSION)
            .send_json(payload)
            .map_err(|e| ZotError::RemotePush {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn update_note(&self, note: &RawNote, html: &str) -> Result<()> {
        let payload = serde_json::json!({ "note": html });
        self.agent
            .request("PATCH", &self.url(&format!("items/{}", note.key)))
            .set("Zotero-API-Key", &self.api_key)
            .set("Zotero-API-Version", API_VERSION)
            .set("If-Unmodified-Since-Version", &note.version.to_string())
            .send_json(payload)
            .map_err(|e| ZotError::RemotePush {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

// Wire shape of a Zotero API item: identifying fields at the top level,
// content under `data`, derived display fields under `meta`.
#[derive(Debug, Deserialize)]
struct ApiItem {
    key: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    data: ApiItemData,
    #[serde(default)]
    meta: ApiItemMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ApiItemData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstractNote")]
    abstract_note: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    extra: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiItemMeta {
    #[serde(default, rename = "creatorSummary")]
    creator_summary: Option<String>,
}

impl ApiItem {
    fn into_raw(self) -> RawItem {
        RawItem {
            key: self.key,
            creator_summary: self.meta.creator_summary,
            title: self.data.title,
            abstract_text: self.data.abstract_note,
            date: self.data.date,
            extra: self.data.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_item_deserializes_and_validates() {
        let json = r#"{
            "key": "AAAAAAAA",
            "version": 31,
            "meta": {"creatorSummary": "Turing"},
            "data": {
                "title": "Computing Machinery",
                "date": "1950",
                "abstractNote": "Can machines think?",
                "extra": "bibtex: turing1950"
            }
        }"#;
        let api_item: ApiItem = serde_json::from_str(json).unwrap();
        let item = api_item.into_raw().into_item();

        assert_eq!(item.key, "AAAAAAAA");
        assert_eq!(item.creator, Some("Turing".to_string()));
        assert_eq!(item.citekey, Some("turing1950".to_string()));
        assert_eq!(item.abstract_text, Some("Can machines think?".to_string()));
    }

    #[test]
    fn test_api_item_tolerates_sparse_fields() {
        let api_item: ApiItem = serde_json::from_str(r#"{"key": "BBBBBBBB"}"#).unwrap();
        let item = api_item.into_raw().into_item();
        assert_eq!(item.title, crate::records::UNTITLED);
        assert_eq!(item.creator, None);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let err = ZoteroApi::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, ZotError::Configuration(_)));
    }
}
