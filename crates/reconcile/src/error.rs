//! Error types for reconciliation.
//!
//! Errors are categorized so the CLI can tell setup mistakes (missing folder,
//! bad definition) apart from failures that happened halfway through an apply.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The local folder is not usable (raised before any diffing).
    Setup,
    /// A blob or sub-collection element is missing.
    NotFound,
    /// The server refused the request (validation, auth).
    Rejected,
    /// Network-related errors (transient, retryable).
    Network,
    /// Reading or writing local content failed.
    Content,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Setup => "Local folder is not set up",
            Self::NotFound => "Referenced content not found",
            Self::Rejected => "Request rejected by server",
            Self::Network => "Network connectivity issue",
            Self::Content => "Local content could not be read or written",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Setup => "Run `confsync init <folder>` or check the folder path",
            Self::NotFound => "Re-run the command; the entity may have changed meanwhile",
            Self::Rejected => "Check your token and the server's message above",
            Self::Network => "Check your connection and re-run; apply is safe to repeat",
            Self::Content => "Check file permissions in the entity folder",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while diffing or applying.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entity folder does not exist.
    #[error("folder does not exist: {}", .0.display())]
    MissingFolder(PathBuf),

    /// The entity folder has no definition file.
    #[error("missing definition file: {}", .0.display())]
    MissingDefinition(PathBuf),

    /// The definition file is not a JSON object.
    #[error("invalid definition {}: {message}", .path.display())]
    InvalidDefinition {
        /// Path of the definition file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A blob, thumbnail or sub-collection element vanished.
    #[error("not found: {0}")]
    NotFound(String),

    /// A file name that cannot be mapped into the entity folder.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// The server rejected a create/update/delete.
    #[error("server rejected request: {message}")]
    RemoteRejected {
        /// Server-provided message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Talking to the server failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading blob content failed.
    #[error("failed to read content of {name}: {source}")]
    ContentReadError {
        /// Blob name (file name or `thumb`).
        name: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// IO error while writing the local folder.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a content read error for a named blob.
    pub fn content_read(name: impl Into<String>, source: io::Error) -> Self {
        Self::ContentReadError {
            name: name.into(),
            source,
        }
    }

    /// Create a rejection error.
    pub fn rejected(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::RemoteRejected {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingFolder(_)
            | Error::MissingDefinition(_)
            | Error::InvalidDefinition { .. }
            | Error::InvalidName(_) => ErrorCategory::Setup,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::RemoteRejected { .. } => ErrorCategory::Rejected,
            Error::Transport(_) => ErrorCategory::Network,
            Error::ContentReadError { .. } | Error::Io { .. } => ErrorCategory::Content,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
