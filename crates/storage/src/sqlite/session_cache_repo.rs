use super::{
    SqliteRepository,
    mapping::{map_cached_session_row, state_to_json},
};
use crate::repository::{CachedSession, SessionCacheRepository, StorageError};

#[async_trait::async_trait]
impl SessionCacheRepository for SqliteRepository {
    async fn save_current(&self, session: &CachedSession) -> Result<(), StorageError> {
        let state_json = state_to_json(&session.state)?;

        sqlx::query(
            r"
                INSERT INTO session_cache (
                    slot, username, subject, topic, difficulty, started_at, state_json
                )
                VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(slot) DO UPDATE SET
                    username = excluded.username,
                    subject = excluded.subject,
                    topic = excluded.topic,
                    difficulty = excluded.difficulty,
                    started_at = excluded.started_at,
                    state_json = excluded.state_json
            ",
        )
        .bind(session.username.as_str())
        .bind(&session.selection.subject)
        .bind(&session.selection.topic)
        .bind(session.selection.difficulty.as_str())
        .bind(session.started_at)
        .bind(state_json)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn load_current(&self) -> Result<Option<CachedSession>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT username, subject, topic, difficulty, started_at, state_json
                FROM session_cache
                WHERE slot = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_cached_session_row).transpose()
    }

    async fn clear_current(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_cache WHERE slot = 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
