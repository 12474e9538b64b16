use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("topic {topic:?} does not belong to subject {subject:?}")]
    UnknownTopic { subject: String, topic: String },

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

/// Difficulty level requested from the question generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(SelectionError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// A subject offered for quizzes together with its topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectEntry {
    pub name: &'static str,
    pub topics: &'static [&'static str],
}

const SUBJECTS: &[SubjectEntry] = &[
    SubjectEntry {
        name: "Mathematics",
        topics: &["Algebra", "Geometry", "Calculus"],
    },
    SubjectEntry {
        name: "Science",
        topics: &["Physics", "Biology", "Chemistry"],
    },
    SubjectEntry {
        name: "History",
        topics: &["Ancient", "Medieval", "Modern"],
    },
    SubjectEntry {
        name: "General Knowledge",
        topics: &["Current Affairs", "Geography", "Politics"],
    },
    SubjectEntry {
        name: "Machine Learning",
        topics: &[
            "Neural Networks",
            "Supervised Learning",
            "Unsupervised Learning",
        ],
    },
];

/// Fixed table of subjects and topics a quiz can be generated for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    #[must_use]
    pub fn subjects(self) -> &'static [SubjectEntry] {
        SUBJECTS
    }

    /// Look up a subject by name, ignoring ASCII case.
    #[must_use]
    pub fn subject(self, name: &str) -> Option<&'static SubjectEntry> {
        let name = name.trim();
        SUBJECTS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Validate a subject/topic/difficulty triple against the catalog.
    ///
    /// Names are normalized to their catalog spelling.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` if the subject, topic, or difficulty is unknown.
    pub fn select(
        self,
        subject: &str,
        topic: &str,
        difficulty: &str,
    ) -> Result<QuizSelection, SelectionError> {
        let entry = self
            .subject(subject)
            .ok_or_else(|| SelectionError::UnknownSubject(subject.to_string()))?;
        let topic_name = entry
            .topics
            .iter()
            .find(|t| t.eq_ignore_ascii_case(topic.trim()))
            .ok_or_else(|| SelectionError::UnknownTopic {
                subject: entry.name.to_string(),
                topic: topic.to_string(),
            })?;
        let difficulty = difficulty.parse()?;

        Ok(QuizSelection {
            subject: entry.name.to_string(),
            topic: (*topic_name).to_string(),
            difficulty,
        })
    }
}

/// Subject, topic, and difficulty chosen for one quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSelection {
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
}

impl QuizSelection {
    /// Topic string sent to the generator, e.g. `"Science: Physics"`.
    #[must_use]
    pub fn generator_topic(&self) -> String {
        format!("{}: {}", self.subject, self.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_normalizes_names() {
        let sel = Catalog.select("science", "PHYSICS", "hard").unwrap();
        assert_eq!(sel.subject, "Science");
        assert_eq!(sel.topic, "Physics");
        assert_eq!(sel.difficulty, Difficulty::Hard);
        assert_eq!(sel.generator_topic(), "Science: Physics");
    }

    #[test]
    fn topic_must_belong_to_subject() {
        let err = Catalog.select("History", "Algebra", "Easy").unwrap_err();
        assert!(matches!(err, SelectionError::UnknownTopic { .. }));
    }

    #[test]
    fn unknown_subject_and_difficulty_fail() {
        assert!(matches!(
            Catalog.select("Cooking", "Baking", "Easy").unwrap_err(),
            SelectionError::UnknownSubject(_)
        ));
        assert!(matches!(
            Catalog.select("Mathematics", "Algebra", "Impossible").unwrap_err(),
            SelectionError::UnknownDifficulty(_)
        ));
    }

    #[test]
    fn catalog_lists_every_subject_with_three_topics() {
        assert_eq!(Catalog.subjects().len(), 5);
        assert!(Catalog.subjects().iter().all(|s| s.topics.len() == 3));
    }
}
