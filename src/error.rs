//! Error types shared by the store, the catalog and the CRUD surface.

use thiserror::Error;

/// Everything that can go wrong while viewing or managing slides.
///
/// The first three variants are local, recoverable conditions reported
/// back to whoever issued the request. The rest wrap failures of the
/// collaborators (SQLite, the filesystem, the blocking pool).
#[derive(Error, Debug)]
pub enum SlideError {
    /// A required field was missing or empty
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    /// An identifier or position did not resolve to a slide
    #[error("slide not found: {0}")]
    NotFound(String),

    /// A position was not a well-formed integer
    #[error("not a valid number: {0:?}")]
    Parse(String),

    /// A viewer command that matches no entry of the dispatch table
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SlideError {
    /// Shorthand for a [`SlideError::Validation`] on `field`.
    pub fn missing(field: &'static str) -> Self {
        SlideError::Validation { field }
    }

    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            SlideError::Validation { .. }
            | SlideError::Parse(_)
            | SlideError::UnknownCommand(_) => 400,
            SlideError::NotFound(_) => 404,
            SlideError::Database(_)
            | SlideError::Io(_)
            | SlideError::Json(_)
            | SlideError::Task(_) => 500,
        }
    }

    /// True for the conditions a caller can fix by changing its input.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

pub type Result<T> = std::result::Result<T, SlideError>;
