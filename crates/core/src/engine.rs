//! Quiz session state machine.
//!
//! ```text
//! AwaitingAnswer --select_answer--------> AnswerRecorded
//! AwaitingAnswer --tick (time limit hit)-> scored wrong, auto-advance
//! AnswerRecorded --advance---------------> AwaitingAnswer (next) | Finished
//! ```
//!
//! `Finished` is terminal. The engine never reads the wall clock; the host
//! calls `tick` once per second while the session is active.

use rand::Rng;
use thiserror::Error;

use crate::model::{Question, SessionPhase, SessionSettings, SessionState, SessionTally};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("cannot start a session without questions")]
    EmptyQuestionSet,

    #[error("option index {index} out of range for {len} options")]
    InvalidOptionIndex { index: usize, len: usize },

    #[error("the current question has already been answered")]
    AlreadyAnswered,

    #[error("session already finished")]
    SessionFinished,

    #[error("inconsistent session state: {0}")]
    InvalidState(&'static str),
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives one quiz attempt from the first question to the final tally.
#[derive(Debug, Clone)]
pub struct QuizSessionEngine {
    state: SessionState,
    time_limit_secs: u32,
}

impl QuizSessionEngine {
    /// Start a session over `questions` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyQuestionSet` if `questions` is empty.
    pub fn start(
        questions: Vec<Question>,
        settings: &SessionSettings,
    ) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::EmptyQuestionSet);
        }
        Ok(Self {
            state: SessionState::fresh(questions),
            time_limit_secs: settings.time_limit_secs(),
        })
    }

    /// Shuffle each question's options once with `rng`, then start.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyQuestionSet` if `questions` is empty.
    pub fn start_shuffled<R: Rng + ?Sized>(
        mut questions: Vec<Question>,
        settings: &SessionSettings,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        for question in &mut questions {
            question.shuffle_options(rng);
        }
        Self::start(questions, settings)
    }

    /// Rehydrate an engine from a cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyQuestionSet` for a snapshot without questions and
    /// `EngineError::InvalidState` when counters or indices contradict each other.
    pub fn resume(state: SessionState, settings: &SessionSettings) -> Result<Self, EngineError> {
        let len = state.questions.len();
        if len == 0 {
            return Err(EngineError::EmptyQuestionSet);
        }
        if state.active_index >= len {
            return Err(EngineError::InvalidState("active index out of range"));
        }
        if let Some(selected) = state.selected_option {
            if selected >= state.questions[state.active_index].options().len() {
                return Err(EngineError::InvalidState("selected option out of range"));
            }
        }

        // Every question before the active one is scored, plus the active one
        // when it has a selection or the session is over.
        let active_scored = state.finished || state.selected_option.is_some();
        let expected = state.active_index + usize::from(active_scored);
        let scored = usize::try_from(state.scored()).unwrap_or(usize::MAX);
        if scored != expected {
            return Err(EngineError::InvalidState("score counts do not match progress"));
        }
        if state.finished && state.active_index + 1 != len {
            return Err(EngineError::InvalidState("finished before the last question"));
        }

        Ok(Self {
            state,
            time_limit_secs: settings.time_limit_secs(),
        })
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.state.current_question()
    }

    /// Seconds left on the countdown for the active question.
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.time_limit_secs
            .saturating_sub(self.state.elapsed_seconds)
    }

    /// Whether the per-question countdown is running.
    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.phase() == SessionPhase::AwaitingAnswer
    }

    /// Final tally, available once the session has finished.
    #[must_use]
    pub fn tally(&self) -> Option<SessionTally> {
        if !self.state.finished {
            return None;
        }
        Some(SessionTally {
            correct: self.state.correct_count,
            wrong: self.state.wrong_count,
            total_seconds_used: self.state.total_seconds_used,
            total_questions: u32::try_from(self.state.questions.len()).unwrap_or(u32::MAX),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Once the elapsed time exceeds the limit with no answer chosen, the
    /// question is scored wrong and the session moves on. Ticks are ignored
    /// while an answer is recorded or after the session finished.
    pub fn tick(&mut self) -> &SessionState {
        if !self.timer_running() {
            return &self.state;
        }

        self.state.elapsed_seconds = self.state.elapsed_seconds.saturating_add(1);
        if self.state.elapsed_seconds > self.time_limit_secs {
            self.state.wrong_count = self.state.wrong_count.saturating_add(1);
            self.move_next();
        }
        &self.state
    }

    /// Record the chosen option for the active question and stop its countdown.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionFinished` after termination,
    /// `EngineError::AlreadyAnswered` on a second selection for the same question, and
    /// `EngineError::InvalidOptionIndex` if `index` is outside the option list.
    pub fn select_answer(&mut self, index: usize) -> Result<&SessionState, EngineError> {
        if self.state.finished {
            return Err(EngineError::SessionFinished);
        }
        if self.state.selected_option.is_some() {
            return Err(EngineError::AlreadyAnswered);
        }

        let question = &self.state.questions[self.state.active_index];
        let len = question.options().len();
        if index >= len {
            return Err(EngineError::InvalidOptionIndex { index, len });
        }

        if question.is_correct(index) {
            self.state.correct_count = self.state.correct_count.saturating_add(1);
        } else {
            self.state.wrong_count = self.state.wrong_count.saturating_add(1);
        }
        self.state.total_seconds_used = self
            .state
            .total_seconds_used
            .saturating_add(self.state.elapsed_seconds);
        self.state.selected_option = Some(index);

        Ok(&self.state)
    }

    /// Move to the next question, or finish after the last one.
    ///
    /// An unanswered question is scored wrong before moving on.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionFinished` if the session already ended.
    pub fn advance(&mut self) -> Result<&SessionState, EngineError> {
        if self.state.finished {
            return Err(EngineError::SessionFinished);
        }
        if self.state.selected_option.is_none() {
            self.state.wrong_count = self.state.wrong_count.saturating_add(1);
        }
        self.move_next();
        Ok(&self.state)
    }

    fn move_next(&mut self) {
        self.state.selected_option = None;
        self.state.elapsed_seconds = 0;
        if self.state.active_index + 1 < self.state.questions.len() {
            self.state.active_index += 1;
        } else {
            self.state.finished = true;
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

    fn question(text: &str, options: &[&str], correct: &str) -> Question {
        Question::new(
            text,
            options.iter().map(|o| (*o).to_string()).collect(),
            correct,
        )
        .unwrap()
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| question(&format!("Q{i}"), &["a", "b", "c"], "b"))
            .collect()
    }

    fn engine(n: usize) -> QuizSessionEngine {
        QuizSessionEngine::start(questions(n), &SessionSettings::default()).unwrap()
    }

    fn assert_scored_once(engine: &QuizSessionEngine) {
        let s = engine.state();
        let expected = s.active_index() + usize::from(s.is_finished());
        assert_eq!(s.scored() as usize, expected);
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = QuizSessionEngine::start(Vec::new(), &SessionSettings::default()).unwrap_err();
        assert_eq!(err, EngineError::EmptyQuestionSet);
    }

    #[test]
    fn start_initializes_counters() {
        let e = engine(3);
        let s = e.state();
        assert_eq!(s.active_index(), 0);
        assert_eq!(s.elapsed_seconds(), 0);
        assert_eq!(s.selected_option(), None);
        assert_eq!((s.correct_count(), s.wrong_count()), (0, 0));
        assert!(!s.is_finished());
        assert_eq!(e.phase(), SessionPhase::AwaitingAnswer);
        assert!(e.tally().is_none());
    }

    #[test]
    fn advancing_len_times_finishes_exactly_at_the_end() {
        for n in 1..6 {
            let mut e = engine(n);
            for i in 0..n {
                assert!(!e.is_finished(), "finished early at step {i} of {n}");
                e.advance().unwrap();
                assert_scored_once(&e);
            }
            assert!(e.is_finished());
            assert_eq!(e.advance().unwrap_err(), EngineError::SessionFinished);
        }
    }

    #[test]
    fn single_correct_answer_example() {
        let mut e = QuizSessionEngine::start(
            vec![question("2+2?", &["3", "4", "5"], "4")],
            &SessionSettings::default(),
        )
        .unwrap();

        let s = e.select_answer(1).unwrap();
        assert_eq!((s.correct_count(), s.wrong_count()), (1, 0));
        assert_eq!(s.selection_is_correct(), Some(true));

        e.advance().unwrap();
        let tally = e.tally().unwrap();
        assert_eq!(tally.correct, 1);
        assert_eq!(tally.wrong, 0);
        assert_eq!(tally.total_questions, 1);
    }

    #[test]
    fn wrong_answer_adds_elapsed_time() {
        let mut e = engine(2);
        for _ in 0..7 {
            e.tick();
        }
        let s = e.select_answer(0).unwrap();
        assert_eq!(s.wrong_count(), 1);
        assert_eq!(s.total_seconds_used(), 7);
        assert_eq!(s.selection_is_correct(), Some(false));
        assert_eq!(e.phase(), SessionPhase::AnswerRecorded);
    }

    #[test]
    fn answering_stops_the_countdown() {
        let mut e = engine(2);
        e.tick();
        e.select_answer(1).unwrap();
        for _ in 0..200 {
            e.tick();
        }
        let s = e.state();
        assert_eq!(s.active_index(), 0);
        assert_eq!(s.elapsed_seconds(), 1);
        assert_eq!(s.scored(), 1);
    }

    #[test]
    fn second_selection_on_same_question_is_rejected() {
        let mut e = engine(2);
        e.select_answer(1).unwrap();
        assert_eq!(e.select_answer(0).unwrap_err(), EngineError::AlreadyAnswered);
        assert_eq!(e.state().correct_count(), 1);
        assert_eq!(e.state().wrong_count(), 0);
    }

    #[test]
    fn invalid_option_index_fails_loudly() {
        let mut e = engine(1);
        let err = e.select_answer(3).unwrap_err();
        assert_eq!(err, EngineError::InvalidOptionIndex { index: 3, len: 3 });
        assert_eq!(e.phase(), SessionPhase::AwaitingAnswer);
    }

    #[test]
    fn timeout_after_sixty_one_ticks_advances_once() {
        let mut e = engine(3);
        for _ in 0..60 {
            e.tick();
        }
        assert_eq!(e.state().active_index(), 0);
        assert_eq!(e.remaining_seconds(), 0);

        e.tick();
        let s = e.state();
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.wrong_count(), 1);
        assert_eq!(s.elapsed_seconds(), 0);
        assert_eq!(s.total_seconds_used(), 0);
        assert_scored_once(&e);
    }

    #[test]
    fn two_silent_questions_finish_with_two_wrong() {
        let mut e = engine(2);
        for _ in 0..61 {
            e.tick();
        }
        assert_eq!(e.state().wrong_count(), 1);
        for _ in 0..61 {
            e.tick();
        }
        assert!(e.is_finished());
        let tally = e.tally().unwrap();
        assert_eq!((tally.correct, tally.wrong), (0, 2));

        // Ticks after the end are ignored.
        e.tick();
        assert_eq!(e.state().wrong_count(), 2);
    }

    #[test]
    fn custom_time_limit_is_respected() {
        let settings = SessionSettings::new(5, 3).unwrap();
        let mut e = QuizSessionEngine::start(questions(2), &settings).unwrap();
        for _ in 0..6 {
            e.tick();
        }
        assert_eq!(e.state().active_index(), 1);
    }

    #[test]
    fn finished_session_rejects_mutations() {
        let mut e = engine(1);
        e.select_answer(1).unwrap();
        e.advance().unwrap();
        assert_eq!(e.select_answer(0).unwrap_err(), EngineError::SessionFinished);
        assert_eq!(e.advance().unwrap_err(), EngineError::SessionFinished);
        assert_eq!(e.phase(), SessionPhase::Finished);
        assert!(e.current_question().is_none());
    }

    #[test]
    fn scoring_compares_by_value_after_shuffle() {
        let mut rng = StdRng::seed_from_u64(3);
        let qs = vec![
            question("capital of France", &["Berlin", "Paris", "Rome", "Madrid"], "Paris"),
            question("2*3", &["5", "6", "7"], "6"),
        ];
        let mut e =
            QuizSessionEngine::start_shuffled(qs, &SessionSettings::default(), &mut rng).unwrap();

        while let Some(q) = e.current_question() {
            let idx = q.correct_index();
            assert_eq!(q.options()[idx], q.correct_answer());
            e.select_answer(idx).unwrap();
            e.advance().unwrap();
        }
        assert_eq!(e.tally().unwrap().correct, 2);
    }

    #[test]
    fn resume_round_trips_a_mid_session_snapshot() {
        let mut e = engine(3);
        e.select_answer(1).unwrap();
        e.advance().unwrap();
        e.tick();
        let snapshot = e.state().clone();

        let resumed = QuizSessionEngine::resume(snapshot.clone(), &SessionSettings::default())
            .unwrap();
        assert_eq!(resumed.state(), &snapshot);
    }

    #[test]
    fn resume_rejects_inconsistent_counts() {
        let mut e = engine(2);
        e.advance().unwrap();
        let mut state = e.into_state();
        state.correct_count = 5;
        let err = QuizSessionEngine::resume(state, &SessionSettings::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }
}
