//! Error types for steamlib.
//!
//! Library crates use [`SteamError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Besides the transport-level variants, the enum carries the aggregation
//! taxonomy: [`SteamError::NotebookList`], [`SteamError::DefaultNotebook`],
//! [`SteamError::NotebookFetch`], [`SteamError::NoteList`],
//! [`SteamError::NoteFetch`] and [`SteamError::TagFetch`]. Each of those boxes the
//! underlying cause as its source.

use std::path::PathBuf;

/// Top-level error type for all steamlib operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure talking to the note service.
    #[error("network error: {0}")]
    Network(String),

    /// The note service answered with a non-success status.
    #[error("remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// A response body could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (missing guid, bad option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Listing the account's notebooks failed.
    #[error("failed to list notebooks: {source}")]
    NotebookList { source: Box<SteamError> },

    /// The account has no default notebook, or looking it up failed.
    #[error("failed to resolve default notebook: {source}")]
    DefaultNotebook { source: Box<SteamError> },

    /// Looking up a single notebook by guid failed.
    #[error("failed to fetch notebook {notebook_guid}: {source}")]
    NotebookFetch {
        notebook_guid: String,
        source: Box<SteamError>,
    },

    /// The paged note-summary listing failed for a notebook.
    #[error("failed to list notes in notebook {notebook_guid}: {source}")]
    NoteList {
        notebook_guid: String,
        source: Box<SteamError>,
    },

    /// Fetching a full note body failed.
    #[error("failed to fetch note {note_guid}: {source}")]
    NoteFetch {
        note_guid: String,
        source: Box<SteamError>,
    },

    /// Looking up a single tag failed. Never fatal to the owning note.
    #[error("failed to fetch tag {tag_guid}: {source}")]
    TagFetch {
        tag_guid: String,
        source: Box<SteamError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SteamError>;

impl SteamError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stand-in cause for a call that succeeded but returned nothing.
    pub fn empty_response(what: &str) -> Self {
        Self::parse(format!("note service returned an empty {what}"))
    }

    pub fn notebook_list(source: SteamError) -> Self {
        Self::NotebookList {
            source: Box::new(source),
        }
    }

    pub fn default_notebook(source: SteamError) -> Self {
        Self::DefaultNotebook {
            source: Box::new(source),
        }
    }

    pub fn notebook_fetch(notebook_guid: impl Into<String>, source: SteamError) -> Self {
        Self::NotebookFetch {
            notebook_guid: notebook_guid.into(),
            source: Box::new(source),
        }
    }

    pub fn note_list(notebook_guid: impl Into<String>, source: SteamError) -> Self {
        Self::NoteList {
            notebook_guid: notebook_guid.into(),
            source: Box::new(source),
        }
    }

    pub fn note_fetch(note_guid: impl Into<String>, source: SteamError) -> Self {
        Self::NoteFetch {
            note_guid: note_guid.into(),
            source: Box::new(source),
        }
    }

    pub fn tag_fetch(tag_guid: impl Into<String>, source: SteamError) -> Self {
        Self::TagFetch {
            tag_guid: tag_guid.into(),
            source: Box::new(source),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Transport failures, HTTP 5xx and HTTP 429 are transient. Taxonomy
    /// variants defer to their cause.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Remote { status, .. } => *status >= 500 || *status == 429,
            Self::NotebookList { source }
            | Self::DefaultNotebook { source }
            | Self::NotebookFetch { source, .. }
            | Self::NoteList { source, .. }
            | Self::NoteFetch { source, .. }
            | Self::TagFetch { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}
