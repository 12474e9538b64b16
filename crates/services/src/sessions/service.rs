use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::QuizSessionEngine;
use quiz_core::model::{
    HistoryEntryId, QuizSelection, SessionPhase, SessionState, SessionTally, Username,
};
use storage::repository::CachedSession;

//
// ─── STEP RESULT ───────────────────────────────────────────────────────────────
//

/// Snapshot returned after every mutation so hosts can render without holding the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub state: SessionState,
    pub phase: SessionPhase,
    pub remaining_seconds: u32,
    /// Set when this step moved on because the countdown expired.
    pub timed_out: bool,
    pub tally: Option<SessionTally>,
    pub history_id: Option<HistoryEntryId>,
}

//
// ─── SESSION HANDLE ────────────────────────────────────────────────────────────
//

/// One quiz attempt owned by the caller.
///
/// Created by `QuizLoopService::start_session` or `resume_session` and passed
/// back into the service for every mutation.
pub struct QuizSession {
    owner: Username,
    selection: QuizSelection,
    started_at: DateTime<Utc>,
    engine: QuizSessionEngine,
    history_id: Option<HistoryEntryId>,
}

impl QuizSession {
    pub(crate) fn new(
        owner: Username,
        selection: QuizSelection,
        started_at: DateTime<Utc>,
        engine: QuizSessionEngine,
    ) -> Self {
        Self {
            owner,
            selection,
            started_at,
            engine,
            history_id: None,
        }
    }

    #[must_use]
    pub fn owner(&self) -> &Username {
        &self.owner
    }

    #[must_use]
    pub fn selection(&self) -> &QuizSelection {
        &self.selection
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn engine(&self) -> &QuizSessionEngine {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut QuizSessionEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.engine.is_finished()
    }

    #[must_use]
    pub fn tally(&self) -> Option<SessionTally> {
        self.engine.tally()
    }

    /// Id of the history entry written when the session finished.
    #[must_use]
    pub fn history_id(&self) -> Option<HistoryEntryId> {
        self.history_id
    }

    pub(crate) fn set_history_id(&mut self, id: HistoryEntryId) {
        self.history_id = Some(id);
    }

    pub(crate) fn to_cached(&self) -> CachedSession {
        CachedSession {
            username: self.owner.clone(),
            selection: self.selection.clone(),
            started_at: self.started_at,
            state: self.engine.state().clone(),
        }
    }

    pub(crate) fn step(&self, timed_out: bool) -> SessionStep {
        SessionStep {
            state: self.engine.state().clone(),
            phase: self.engine.phase(),
            remaining_seconds: self.engine.remaining_seconds(),
            timed_out,
            tally: self.engine.tally(),
            history_id: self.history_id,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.engine.state();
        f.debug_struct("QuizSession")
            .field("owner", &self.owner)
            .field("subject", &self.selection.subject)
            .field("questions_len", &state.questions().len())
            .field("active_index", &state.active_index())
            .field("finished", &state.is_finished())
            .field("history_id", &self.history_id)
            .finish_non_exhaustive()
    }
}
