//! Error types for blurg core operations.
//!
//! Two families mirror the two kinds of contract violation the core can
//! report: [`DiaryError`] for factory and per-diary operations, and
//! [`ConfigError`] for registry-level operations. [`TransportError`] is the
//! raw failure of the HTTP collaborator and never escapes a diary call; it is
//! converted at the remote client boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for diary and factory operations.
pub type DiaryResult<T> = std::result::Result<T, DiaryError>;

/// Result type alias for config (registry) operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised by diary factories and diary backends.
#[derive(Debug, Error)]
pub enum DiaryError {
    /// Name is reserved (`config`, and `default` for remote diaries)
    #[error("Diary name \"{0}\" is reserved")]
    ReservedName(String),

    /// Name cannot be used as a diary identifier
    #[error("Invalid diary name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    /// A local or remote diary already uses the name
    #[error("A diary named \"{0}\" already exists")]
    AlreadyExists(String),

    /// Diary storage or record is gone
    #[error("Diary \"{0}\" does not exist")]
    NotFound(String),

    /// No entry with the given id
    #[error("Entry {0} not found")]
    EntryNotFound(u64),

    /// Entry text was blank
    #[error("Entry text must not be empty")]
    EmptyEntry,

    #[error("Diary key must not be empty")]
    EmptyKey,

    /// The remote server could not be contacted
    #[error("Remote server unreachable: {0}")]
    Unreachable(String),

    /// The remote server answered with an error result
    #[error("Remote server rejected request: {0}")]
    Rejected(String),

    /// The remote server answered with something we cannot interpret
    #[error("Unexpected response from remote server: {0}")]
    Protocol(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Registry could not be read or updated
    #[error("Registry error: {0}")]
    Registry(String),
}

/// Errors raised by [`crate::Config`] operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a diary nor a name was supplied
    #[error("A diary or a diary name is required")]
    MissingTarget,

    /// `config` can never name a diary
    #[error("Diary name \"{0}\" is reserved")]
    ReservedName(String),

    /// Name is not in the registry
    #[error("No diary named \"{0}\"")]
    UnknownDiary(String),

    #[error("Diary \"{0}\" is already remote")]
    AlreadyRemote(String),

    #[error("Diary \"{0}\" is not a remote diary")]
    NotRemote(String),

    #[error("Cannot demote \"{0}\" while it is the current diary")]
    DemoteCurrent(String),

    /// Remote-file queries make no sense for local diaries
    #[error("Local diary \"{0}\" has no remote files")]
    LocalHasNoRemoteFiles(String),

    /// The current pointer names a diary missing from the registry
    #[error("Current diary \"{0}\" is not registered")]
    DanglingCurrent(String),

    /// No registry exists at the base directory
    #[error("No blurg configuration at {}", .0.display())]
    Uninitialized(PathBuf),

    /// Registry exists but violates its invariants or cannot be parsed
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A diary backend failed while the registry was being changed
    #[error(transparent)]
    Diary(#[from] DiaryError),
}

/// Failure of the HTTP collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established
    #[error("{0}")]
    Unreachable(String),

    /// Any other transport-level failure
    #[error("{0}")]
    Http(String),
}

impl From<TransportError> for DiaryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable(msg) => DiaryError::Unreachable(msg),
            TransportError::Http(msg) => DiaryError::Protocol(msg),
        }
    }
}

impl From<ConfigError> for DiaryError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Diary(inner) => inner,
            other => DiaryError::Registry(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DiaryError {
    fn from(err: serde_json::Error) -> Self {
        DiaryError::Protocol(err.to_string())
    }
}
