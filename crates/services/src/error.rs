//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::EngineError;
use quiz_core::model::HistoryError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question payload is not a question list: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("username is required")]
    MissingUsername,
    #[error("unknown or expired token")]
    UnknownToken,
    #[error("token table is unavailable")]
    TokenStore,
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    NoQuestions,
    #[error(transparent)]
    Source(#[from] QuestionSourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Source(#[from] QuestionSourceError),
}
