use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{self, Difficulty, HistoryEntryId, Username};
use storage::repository::{HistoryRepository, HistoryRow};

use crate::error::SessionError;

/// Presentation-agnostic list item for a completed attempt.
///
/// No pre-formatted strings; the host decides how to render times and scores.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryListItem {
    pub id: HistoryEntryId,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub total_questions: u32,
    pub seconds_used: u32,
    pub completed_at: DateTime<Utc>,
    pub accuracy_percent: f64,
}

impl HistoryListItem {
    #[must_use]
    pub fn from_row(row: &HistoryRow) -> Self {
        let entry = &row.entry;
        let accuracy_percent = if entry.total_questions() == 0 {
            0.0
        } else {
            f64::from(entry.score()) * 100.0 / f64::from(entry.total_questions())
        };
        Self {
            id: row.id,
            subject: entry.subject().to_string(),
            topic: entry.topic().to_string(),
            difficulty: entry.difficulty(),
            score: entry.score(),
            total_questions: entry.total_questions(),
            seconds_used: entry.seconds_used(),
            completed_at: entry.completed_at(),
            accuracy_percent,
        }
    }
}

/// Attempts and best score for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectStatsItem {
    pub subject: String,
    pub attempts: u32,
    pub best_score: u32,
}

/// Read-only facade over a user's completed attempts.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Most recent attempts for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_history(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<HistoryListItem>, SessionError> {
        let rows = self.history.list_entries(username, limit).await?;
        Ok(rows.iter().map(HistoryListItem::from_row).collect())
    }

    /// The user's latest attempt, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn latest_result(
        &self,
        username: &Username,
    ) -> Result<Option<HistoryListItem>, SessionError> {
        let row = self.history.latest_entry(username).await?;
        Ok(row.as_ref().map(HistoryListItem::from_row))
    }

    /// Per-subject attempt counts and best scores, sorted by subject name.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn subject_stats(
        &self,
        username: &Username,
    ) -> Result<Vec<SubjectStatsItem>, SessionError> {
        let rows = self.history.list_entries(username, u32::MAX).await?;
        let stats = model::subject_stats(rows.iter().map(|row| &row.entry));
        Ok(stats
            .into_iter()
            .map(|(subject, s)| SubjectStatsItem {
                subject,
                attempts: s.attempts,
                best_score: s.best_score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::HistoryEntry;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn entry(user: &str, subject: &str, score: u32, minutes: i64) -> HistoryEntry {
        HistoryEntry::from_persisted(
            Username::new(user).unwrap(),
            subject.into(),
            "Algebra".into(),
            Difficulty::Medium,
            score,
            4,
            40,
            fixed_now() + Duration::minutes(minutes),
        )
        .unwrap()
    }

    async fn seeded() -> HistoryService {
        let repo = InMemoryRepository::new();
        repo.append_entry(&entry("ada", "Science", 1, 0)).await.unwrap();
        repo.append_entry(&entry("ada", "Mathematics", 3, 1)).await.unwrap();
        repo.append_entry(&entry("ada", "Science", 4, 2)).await.unwrap();
        repo.append_entry(&entry("bob", "History", 2, 3)).await.unwrap();
        HistoryService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn list_history_is_newest_first_and_scoped_to_user() {
        let svc = seeded().await;
        let ada = Username::new("ada").unwrap();

        let items = svc.list_history(&ada, 10).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].subject, "Science");
        assert_eq!(items[0].score, 4);
        assert!((items[0].accuracy_percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(items[1].subject, "Mathematics");

        let latest = svc.latest_result(&ada).await.unwrap().unwrap();
        assert_eq!(latest, items[0]);
    }

    #[tokio::test]
    async fn subject_stats_are_sorted_by_subject() {
        let svc = seeded().await;
        let stats = svc
            .subject_stats(&Username::new("ada").unwrap())
            .await
            .unwrap();

        assert_eq!(
            stats,
            vec![
                SubjectStatsItem {
                    subject: "Mathematics".into(),
                    attempts: 1,
                    best_score: 3,
                },
                SubjectStatsItem {
                    subject: "Science".into(),
                    attempts: 2,
                    best_score: 4,
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_user_has_no_history() {
        let svc = HistoryService::in_memory();
        let nobody = Username::new("nobody").unwrap();
        assert!(svc.list_history(&nobody, 5).await.unwrap().is_empty());
        assert!(svc.latest_result(&nobody).await.unwrap().is_none());
        assert!(svc.subject_stats(&nobody).await.unwrap().is_empty());
    }
}
