use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while validating a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least {min} options, got {len}")]
    TooFewOptions { min: usize, len: usize },

    #[error("correct answer {answer:?} is not one of the options")]
    CorrectAnswerMissing { answer: String },

    #[error("correct answer {answer:?} appears {count} times among the options")]
    AmbiguousCorrectAnswer { answer: String, count: usize },
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Multiple-choice question with exactly one option matching the correct answer.
///
/// Scoring always compares by value, so reordering the options never changes
/// which option is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Minimum number of options a question must offer.
    pub const MIN_OPTIONS: usize = 2;

    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, fewer than two options are
    /// given, or the correct answer does not match exactly one option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let correct_answer = correct_answer.into();

        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: Self::MIN_OPTIONS,
                len: options.len(),
            });
        }

        match options.iter().filter(|o| **o == correct_answer).count() {
            0 => Err(QuestionError::CorrectAnswerMissing {
                answer: correct_answer,
            }),
            1 => Ok(Self {
                text,
                options,
                correct_answer,
            }),
            count => Err(QuestionError::AmbiguousCorrectAnswer {
                answer: correct_answer,
                count,
            }),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Position of the correct answer among the current option order.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        // Construction guarantees exactly one match.
        self.options
            .iter()
            .position(|o| *o == self.correct_answer)
            .unwrap_or_default()
    }

    /// Returns true when the option at `index` is the correct answer.
    ///
    /// Out-of-range indices are never correct.
    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        self.options
            .get(index)
            .is_some_and(|o| *o == self.correct_answer)
    }

    /// Uniformly permute the options in place. The correct answer value is untouched.
    pub fn shuffle_options<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.options.shuffle(rng);
    }
}

/// Wire shape used by the question generator and the session cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(record.question, record.options, record.correct_answer)
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            question: question.text,
            options: question.options,
            correct_answer: question.correct_answer,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn valid_question_builds() {
        let q = Question::new("2+2?", opts(&["3", "4", "5"]), "4").unwrap();
        assert_eq!(q.text(), "2+2?");
        assert_eq!(q.correct_index(), 1);
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert!(!q.is_correct(9));
    }

    #[test]
    fn rejects_blank_text_and_short_options() {
        assert_eq!(
            Question::new("  ", opts(&["a", "b"]), "a").unwrap_err(),
            QuestionError::EmptyText
        );
        assert_eq!(
            Question::new("q", opts(&["a"]), "a").unwrap_err(),
            QuestionError::TooFewOptions { min: 2, len: 1 }
        );
    }

    #[test]
    fn rejects_missing_or_duplicated_answer() {
        let err = Question::new("q", opts(&["a", "b"]), "c").unwrap_err();
        assert!(matches!(err, QuestionError::CorrectAnswerMissing { .. }));

        let err = Question::new("q", opts(&["a", "a", "b"]), "a").unwrap_err();
        assert!(matches!(
            err,
            QuestionError::AmbiguousCorrectAnswer { count: 2, .. }
        ));
    }

    #[test]
    fn shuffle_keeps_exactly_one_correct_option() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut q = Question::new("pick", opts(&["a", "b", "c", "d", "e"]), "c").unwrap();
        for _ in 0..50 {
            q.shuffle_options(&mut rng);
            let matches = (0..q.options().len()).filter(|i| q.is_correct(*i)).count();
            assert_eq!(matches, 1);
            assert_eq!(q.correct_answer(), "c");
        }
    }

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let base = Question::new("pick", opts(&["a", "b", "c", "d", "e", "f"]), "a").unwrap();
        let mut first = base.clone();
        let mut second = base;
        first.shuffle_options(&mut StdRng::seed_from_u64(42));
        second.shuffle_options(&mut StdRng::seed_from_u64(42));
        assert_eq!(first.options(), second.options());
    }

    #[test]
    fn deserializes_generator_payload() {
        let json = r#"{"question":"2+2?","options":["3","4"],"correctAnswer":"4"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_answer(), "4");

        let bad = r#"{"question":"2+2?","options":["3","5"],"correctAnswer":"4"}"#;
        assert!(serde_json::from_str::<Question>(bad).is_err());
    }
}
