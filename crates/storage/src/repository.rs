use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{HistoryEntry, HistoryEntryId, QuizSelection, SessionState, Username};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted history entry together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: HistoryEntryId,
    pub entry: HistoryEntry,
}

impl HistoryRow {
    #[must_use]
    pub fn new(id: HistoryEntryId, entry: HistoryEntry) -> Self {
        Self { id, entry }
    }
}

/// Unfinished attempt kept so it can survive a restart.
///
/// Only one is stored at a time; saving replaces whatever was there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSession {
    pub username: Username,
    pub selection: QuizSelection,
    pub started_at: DateTime<Utc>,
    pub state: SessionState,
}

/// Repository contract for completed quiz attempts.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Persist a completed attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_entry(&self, entry: &HistoryEntry) -> Result<HistoryEntryId, StorageError>;

    /// Fetch a single entry by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_entry(&self, id: HistoryEntryId) -> Result<HistoryEntry, StorageError>;

    /// List a user's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or decoding failures.
    async fn list_entries(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, StorageError>;

    /// Most recent entry for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or decoding failures.
    async fn latest_entry(&self, username: &Username) -> Result<Option<HistoryRow>, StorageError> {
        Ok(self.list_entries(username, 1).await?.into_iter().next())
    }
}

/// Single-slot store for the in-progress session.
#[async_trait]
pub trait SessionCacheRepository: Send + Sync {
    /// Replace the cached session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn save_current(&self, session: &CachedSession) -> Result<(), StorageError>;

    /// Load the cached session, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or decoding failures.
    async fn load_current(&self) -> Result<Option<CachedSession>, StorageError>;

    /// Drop the cached session. Clearing an empty cache is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_current(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<BTreeMap<HistoryEntryId, HistoryEntry>>>,
    current: Arc<Mutex<Option<CachedSession>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_entry(&self, entry: &HistoryEntry) -> Result<HistoryEntryId, StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.keys().next_back().map_or(1, |id| id.value() + 1);
        let id = HistoryEntryId::new(next);
        guard.insert(id, entry.clone());
        Ok(id)
    }

    async fn get_entry(&self, id: HistoryEntryId) -> Result<HistoryEntry, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_entries(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<HistoryRow> = guard
            .iter()
            .filter(|(_, entry)| entry.username() == username)
            .map(|(id, entry)| HistoryRow::new(*id, entry.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.entry
                .completed_at()
                .cmp(&a.entry.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl SessionCacheRepository for InMemoryRepository {
    async fn save_current(&self, session: &CachedSession) -> Result<(), StorageError> {
        let mut guard = self
            .current
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn load_current(&self) -> Result<Option<CachedSession>, StorageError> {
        let guard = self
            .current
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn clear_current(&self) -> Result<(), StorageError> {
        let mut guard = self
            .current
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
    pub session_cache: Arc<dyn SessionCacheRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let history: Arc<dyn HistoryRepository> = Arc::new(repo.clone());
        let session_cache: Arc<dyn SessionCacheRepository> = Arc::new(repo);
        Self {
            history,
            session_cache,
        }
    }
}
