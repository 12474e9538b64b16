use serde::{Deserialize, Serialize};

use crate::model::Question;

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Snapshot of one quiz attempt.
///
/// Owned and mutated only by `QuizSessionEngine`; hosts read it to render the
/// current question, countdown, and feedback. Serializable so an unfinished
/// attempt can be cached and resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub(crate) questions: Vec<Question>,
    pub(crate) active_index: usize,
    pub(crate) elapsed_seconds: u32,
    pub(crate) selected_option: Option<usize>,
    pub(crate) correct_count: u32,
    pub(crate) wrong_count: u32,
    pub(crate) total_seconds_used: u32,
    pub(crate) finished: bool,
}

impl SessionState {
    pub(crate) fn fresh(questions: Vec<Question>) -> Self {
        Self {
            questions,
            active_index: 0,
            elapsed_seconds: 0,
            selected_option: None,
            correct_count: 0,
            wrong_count: 0,
            total_seconds_used: 0,
            finished: false,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Seconds spent on the active question so far.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Option chosen for the active question, `None` while unanswered.
    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    /// Sum of elapsed seconds over explicitly answered questions.
    #[must_use]
    pub fn total_seconds_used(&self) -> u32 {
        self.total_seconds_used
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            None
        } else {
            self.questions.get(self.active_index)
        }
    }

    /// Whether the recorded selection for the active question is correct.
    #[must_use]
    pub fn selection_is_correct(&self) -> Option<bool> {
        let selected = self.selected_option?;
        self.current_question().map(|q| q.is_correct(selected))
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.finished {
            SessionPhase::Finished
        } else if self.selected_option.is_some() {
            SessionPhase::AnswerRecorded
        } else {
            SessionPhase::AwaitingAnswer
        }
    }

    /// Number of questions that have been scored.
    #[must_use]
    pub fn scored(&self) -> u32 {
        self.correct_count.saturating_add(self.wrong_count)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = usize::try_from(self.scored()).unwrap_or(usize::MAX);
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.finished,
        }
    }
}

/// Where the attempt sits in the answer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Countdown running, no option chosen yet.
    AwaitingAnswer,
    /// The active question is scored; waiting for `advance`.
    AnswerRecorded,
    /// Terminal. Only a fresh start leaves this state.
    Finished,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── TALLY ─────────────────────────────────────────────────────────────────────
//

/// Final result handed to the result view once a session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    pub correct: u32,
    pub wrong: u32,
    pub total_seconds_used: u32,
    pub total_questions: u32,
}

impl SessionTally {
    /// Percentage of correct answers, `0.0` for an empty tally.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct) * 100.0 / f64::from(self.total_questions)
    }

    /// Mean seconds spent per explicitly answered question.
    #[must_use]
    pub fn average_seconds_per_question(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.total_seconds_used) / f64::from(self.total_questions)
    }
}
