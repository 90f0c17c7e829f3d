//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::ContentError;
use quiz_core::model::{Mode, ProgressError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Recoverable refusals: state is unchanged and the player may retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SoftRejection {
    #[error("Pick an answer first")]
    NoSelection,
    #[error("No skipping in Streak mode!")]
    SkipNotAllowed,
}

/// Errors emitted by the session engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no quiz content is loaded")]
    NoContent,
    #[error("no mode has been started")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("no question is waiting for an answer")]
    NoActiveQuestion,
    #[error("the current question has not been answered yet")]
    NotAnswered,
    #[error("\"close enough\" is not available right now")]
    CloseEnoughUnavailable,
    #[error("not available in {0} mode")]
    WrongMode(Mode),
    #[error(transparent)]
    Rejected(#[from] SoftRejection),
}

impl SessionError {
    /// Whether this is a soft rejection the player can simply retry.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, SessionError::Rejected(_))
    }
}

/// Errors emitted by `ProgressLedger` operations that may be refused.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("reset requires explicit confirmation")]
    ResetNotConfirmed,
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ContentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentServiceError {
    #[error("could not load quiz file: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
