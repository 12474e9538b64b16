use quiz_core::model::{HistoryEntry, HistoryEntryId, Username};

use super::{
    SqliteRepository,
    mapping::{history_id_from_i64, history_id_to_i64, map_history_row},
};
use crate::repository::{HistoryRepository, HistoryRow, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_entry(&self, entry: &HistoryEntry) -> Result<HistoryEntryId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_history (
                    username, subject, topic, difficulty,
                    score, total_questions, seconds_used, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(entry.username().as_str())
        .bind(entry.subject())
        .bind(entry.topic())
        .bind(entry.difficulty().as_str())
        .bind(i64::from(entry.score()))
        .bind(i64::from(entry.total_questions()))
        .bind(i64::from(entry.seconds_used()))
        .bind(entry.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        history_id_from_i64(res.last_insert_rowid())
    }

    async fn get_entry(&self, id: HistoryEntryId) -> Result<HistoryEntry, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, username, subject, topic, difficulty,
                    score, total_questions, seconds_used, completed_at
                FROM quiz_history
                WHERE id = ?1
            ",
        )
        .bind(history_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        Ok(map_history_row(&row)?.entry)
    }

    async fn list_entries(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<HistoryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, username, subject, topic, difficulty,
                    score, total_questions, seconds_used, completed_at
                FROM quiz_history
                WHERE username = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(username.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_history_row(&row)?);
        }
        Ok(out)
    }
}
