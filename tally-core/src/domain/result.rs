//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Load errors (`DirectoryRead`, `FilenameParse`, `DuplicateVersion`) are
/// raised before the store is touched. The rest come from the store.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot read migrations from {path}: {source}")]
    DirectoryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration filename '{filename}': {reason}")]
    FilenameParse { filename: String, reason: String },

    #[error("Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: i64,
        first: String,
        second: String,
    },

    #[error("Migration metadata error: {0}")]
    Metadata(String),

    #[error("Migration {version} ({description}) failed at statement {index}: {message}")]
    StatementExecution {
        version: i64,
        description: String,
        /// 1-based position of the failing statement within the file
        index: usize,
        statement: String,
        message: String,
    },

    #[error("Migration {version} transaction error: {message}")]
    Transaction { version: i64, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration lock error: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Create a filename parse error
    pub fn filename(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilenameParse {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Version the error is attributed to, if any
    pub fn version(&self) -> Option<i64> {
        match self {
            Self::DuplicateVersion { version, .. }
            | Self::StatementExecution { version, .. }
            | Self::Transaction { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// True for errors raised while reading migration files, before any
    /// database access happened.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::DirectoryRead { .. } | Self::FilenameParse { .. } | Self::DuplicateVersion { .. }
        )
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
