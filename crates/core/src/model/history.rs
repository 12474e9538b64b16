use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Difficulty, QuizSelection, SessionTally, Username};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("history entry needs at least one question")]
    NoQuestions,
}

/// One completed quiz attempt as shown in the user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    username: Username,
    subject: String,
    topic: String,
    difficulty: Difficulty,
    score: u32,
    total_questions: u32,
    seconds_used: u32,
    completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Build a history entry from a finished session.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the tally is empty or inconsistent.
    pub fn from_tally(
        username: Username,
        selection: &QuizSelection,
        tally: &SessionTally,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, HistoryError> {
        Self::from_persisted(
            username,
            selection.subject.clone(),
            selection.topic.clone(),
            selection.difficulty,
            tally.correct,
            tally.total_questions,
            tally.total_seconds_used,
            completed_at,
        )
    }

    /// Rehydrate a history entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::ScoreExceedsTotal` or `HistoryError::NoQuestions`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        username: Username,
        subject: String,
        topic: String,
        difficulty: Difficulty,
        score: u32,
        total_questions: u32,
        seconds_used: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, HistoryError> {
        if total_questions == 0 {
            return Err(HistoryError::NoQuestions);
        }
        if score > total_questions {
            return Err(HistoryError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            username,
            subject,
            topic,
            difficulty,
            score,
            total_questions,
            seconds_used,
            completed_at,
        })
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn seconds_used(&self) -> u32 {
        self.seconds_used
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wrong answers implied by the score.
    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.total_questions - self.score
    }
}

/// Attempts and best score for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubjectStats {
    pub attempts: u32,
    pub best_score: u32,
}

/// Group history entries by subject, keyed by subject name.
#[must_use]
pub fn subject_stats<'a>(
    entries: impl IntoIterator<Item = &'a HistoryEntry>,
) -> BTreeMap<String, SubjectStats> {
    let mut out: BTreeMap<String, SubjectStats> = BTreeMap::new();
    for entry in entries {
        let stats = out.entry(entry.subject.clone()).or_default();
        stats.attempts = stats.attempts.saturating_add(1);
        stats.best_score = stats.best_score.max(entry.score);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn entry(subject: &str, score: u32, total: u32) -> HistoryEntry {
        HistoryEntry::from_persisted(
            Username::new("ada").unwrap(),
            subject.into(),
            "Algebra".into(),
            Difficulty::Easy,
            score,
            total,
            30,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn stats_track_attempts_and_best_score() {
        let entries = vec![
            entry("Mathematics", 3, 5),
            entry("Mathematics", 5, 5),
            entry("Science", 1, 5),
            entry("Mathematics", 2, 5),
        ];
        let stats = subject_stats(&entries);
        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats["Mathematics"],
            SubjectStats {
                attempts: 3,
                best_score: 5
            }
        );
        assert_eq!(stats["Science"].attempts, 1);
    }

    #[test]
    fn score_cannot_exceed_total() {
        let err = HistoryEntry::from_persisted(
            Username::new("ada").unwrap(),
            "Science".into(),
            "Physics".into(),
            Difficulty::Hard,
            6,
            5,
            0,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, HistoryError::ScoreExceedsTotal { score: 6, total: 5 });
    }

    #[test]
    fn from_tally_copies_selection_and_counts() {
        let selection = QuizSelection {
            subject: "History".into(),
            topic: "Modern".into(),
            difficulty: Difficulty::Medium,
        };
        let tally = SessionTally {
            correct: 4,
            wrong: 1,
            total_seconds_used: 90,
            total_questions: 5,
        };
        let e = HistoryEntry::from_tally(Username::new("ada").unwrap(), &selection, &tally, fixed_now())
            .unwrap();
        assert_eq!(e.subject(), "History");
        assert_eq!(e.score(), 4);
        assert_eq!(e.wrong(), 1);
        assert_eq!(e.seconds_used(), 90);
    }
}
