//! Error types and exit codes for zotcli
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args, empty query)
//! - 3: Data/store error (missing configuration, unreadable index)

use thiserror::Error;

/// Exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error - missing configuration, unreadable index (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during zotcli operations
#[derive(Error, Debug)]
pub enum ZotError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    Usage(String),

    #[error("search query must not be empty")]
    EmptyQuery,

    // Data/store errors (exit code 3)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("index error: {0}")]
    Index(String),

    // Recoverable: the note is treated as never edited by this client
    #[error("malformed note payload: {0}")]
    MalformedBlob(String),

    #[error("markup conversion ({format}) failed: {detail}")]
    Conversion { format: String, detail: String },

    #[error("remote request failed: {0}")]
    Remote(String),

    #[error("remote push failed: {reason}")]
    RemotePush { reason: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for ZotError {
    fn from(err: rusqlite::Error) -> Self {
        ZotError::Index(err.to_string())
    }
}

impl ZotError {
    /// Create an error for a failed index operation
    pub fn index_operation(operation: &str, error: impl std::fmt::Display) -> Self {
        ZotError::Index(format!("failed to {}: {}", operation, error))
    }

    /// Create an error for a failed markup conversion
    pub fn conversion(format: &str, detail: impl std::fmt::Display) -> Self {
        ZotError::Conversion {
            format: format.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ZotError::Usage(_) | ZotError::EmptyQuery => ExitCode::Usage,

            ZotError::Configuration(_) | ZotError::Index(_) => ExitCode::Data,

            ZotError::MalformedBlob(_)
            | ZotError::Conversion { .. }
            | ZotError::Remote(_)
            | ZotError::RemotePush { .. }
            | ZotError::Io(_)
            | ZotError::Json(_)
            | ZotError::Toml(_)
            | ZotError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier used in structured output
    fn error_type(&self) -> &'static str {
        match self {
            ZotError::Usage(_) => "usage_error",
            ZotError::EmptyQuery => "empty_query",
            ZotError::Configuration(_) => "configuration_error",
            ZotError::Index(_) => "index_error",
            ZotError::MalformedBlob(_) => "malformed_blob",
            ZotError::Conversion { .. } => "conversion_error",
            ZotError::Remote(_) => "remote_error",
            ZotError::RemotePush { .. } => "remote_push_error",
            ZotError::Io(_) => "io_error",
            ZotError::Json(_) => "json_error",
            ZotError::Toml(_) => "toml_error",
            ZotError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for zotcli operations
pub type Result<T> = std::result::Result<T, ZotError>;
