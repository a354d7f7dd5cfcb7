//! zotcli configuration
//!
//! Stored as TOML in the application config directory (or any explicit
//! path); always passed in explicitly, never read from ambient state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZotError};

/// Name of the application directory under the platform config dir.
pub const APP_DIR: &str = "zotcli";

/// Default markup format notes are edited in.
pub const DEFAULT_NOTE_FORMAT: &str = "markdown";

/// Default minimum interval between automatic syncs, in seconds.
pub const DEFAULT_SYNC_INTERVAL: u64 = 300;

/// Remote library type the API key is scoped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    #[default]
    User,
    Group,
}

impl LibraryType {
    /// URL prefix segment used by the Zotero Web API.
    pub fn api_prefix(self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(LibraryType::User),
            "group" => Ok(LibraryType::Group),
            other => Err(ZotError::Usage(format!(
                "unknown library type: {} (expected: user or group)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Zotero Web API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Library ID the API key is valid for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_id: Option<String>,

    #[serde(default)]
    pub library_type: LibraryType,

    /// Markup format notes are edited in
    #[serde(default = "default_note_format")]
    pub note_format: String,

    /// Minimum seconds between automatic syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,

    /// Local Zotero storage directory for resolving attachments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    /// Path to the local index database (defaults to the app directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

fn default_note_format() -> String {
    DEFAULT_NOTE_FORMAT.to_string()
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            library_id: None,
            library_type: LibraryType::default(),
            note_format: default_note_format(),
            sync_interval: default_sync_interval(),
            storage_dir: None,
            index_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ZotError::Configuration(format!(
                "could not read configuration at {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ZotError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration file location for this platform
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join("config.toml"))
            .ok_or_else(|| {
                ZotError::Configuration("could not determine the application directory".to_string())
            })
    }

    /// API credentials, required before any remote request is constructed
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.library_id.as_deref()) {
            (Some(key), Some(id)) if !key.is_empty() && !id.is_empty() => Ok((key, id)),
            _ => Err(ZotError::Configuration(
                "API key and library ID are not set; run `zotcli configure` \
                 or pass them as command-line options"
                    .to_string(),
            )),
        }
    }

    /// Resolve the index database path
    pub fn resolve_index_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.index_path {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join("index.sqlite"))
            .ok_or_else(|| {
                ZotError::Configuration(
                    "could not determine the application directory; set index_path in the \
                     configuration"
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.note_format, "markdown");
        assert_eq!(config.sync_interval, 300);
        assert_eq!(config.library_type, LibraryType::User);
        assert!(config.api_key.is_none());
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            api_key: Some("abcdef".into()),
            library_id: Some("12345".into()),
            library_type: LibraryType::Group,
            index_path: Some(dir.path().join("index.sqlite")),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.credentials().unwrap(), ("abcdef", "12345"));
        assert_eq!(
            loaded.resolve_index_path().unwrap(),
            dir.path().join("index.sqlite")
        );
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ZotError::Configuration(_)));
    }

    #[test]
    fn test_library_type_parse() {
        assert_eq!(LibraryType::parse("user").unwrap(), LibraryType::User);
        assert_eq!(LibraryType::parse("group").unwrap(), LibraryType::Group);
        assert!(LibraryType::parse("shared").is_err());
        assert_eq!(LibraryType::Group.api_prefix(), "groups");
    }
}
