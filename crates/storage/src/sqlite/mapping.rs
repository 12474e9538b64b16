use quiz_core::model::{
    Difficulty, HistoryEntry, HistoryEntryId, QuizSelection, SessionState, Username,
};
use sqlx::Row;

use crate::repository::{CachedSession, HistoryRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn history_id_to_i64(id: HistoryEntryId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("history id overflow".into()))
}

pub(crate) fn history_id_from_i64(v: i64) -> Result<HistoryEntryId, StorageError> {
    u64::try_from(v)
        .map(HistoryEntryId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid history id: {v}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn parse_username(raw: &str) -> Result<Username, StorageError> {
    Username::new(raw).map_err(ser)
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, StorageError> {
    raw.parse::<Difficulty>().map_err(ser)
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRow, StorageError> {
    let id = history_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let username = parse_username(&row.try_get::<String, _>("username").map_err(ser)?)?;
    let difficulty = parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?;

    let entry = HistoryEntry::from_persisted(
        username,
        row.try_get("subject").map_err(ser)?,
        row.try_get("topic").map_err(ser)?,
        difficulty,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "seconds_used",
            row.try_get::<i64, _>("seconds_used").map_err(ser)?,
        )?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(HistoryRow::new(id, entry))
}

/// The session snapshot is stored as JSON so its question list survives intact.
pub(crate) fn state_to_json(state: &SessionState) -> Result<String, StorageError> {
    serde_json::to_string(state).map_err(ser)
}

pub(crate) fn map_cached_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CachedSession, StorageError> {
    let username = parse_username(&row.try_get::<String, _>("username").map_err(ser)?)?;
    let difficulty = parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?;
    let state_json: String = row.try_get("state_json").map_err(ser)?;
    let state: SessionState = serde_json::from_str(&state_json).map_err(ser)?;

    Ok(CachedSession {
        username,
        selection: QuizSelection {
            subject: row.try_get("subject").map_err(ser)?,
            topic: row.try_get("topic").map_err(ser)?,
            difficulty,
        },
        started_at: row.try_get("started_at").map_err(ser)?,
        state,
    })
}
