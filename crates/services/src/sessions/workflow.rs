use std::sync::Arc;

use quiz_core::model::{HistoryEntry, QuizSelection, SessionSettings};
use quiz_core::{EngineError, QuizSessionEngine};
use rand::Rng;
use storage::repository::{HistoryRepository, SessionCacheRepository, StorageError};
use tracing::{debug, info, warn};

use super::service::{QuizSession, SessionStep};
use crate::Clock;
use crate::auth_service::UserSession;
use crate::error::SessionError;
use crate::question_source::{QuestionRequest, QuestionSource};

/// Orchestrates session start, answering, caching, and history recording.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: SessionSettings,
    source: Arc<dyn QuestionSource>,
    history: Arc<dyn HistoryRepository>,
    cache: Arc<dyn SessionCacheRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: Arc<dyn QuestionSource>,
        history: Arc<dyn HistoryRepository>,
        cache: Arc<dyn SessionCacheRepository>,
    ) -> Self {
        Self {
            clock,
            settings: SessionSettings::default(),
            source,
            history,
            cache,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Fetch questions, shuffle their options with `rng`, and start a new attempt.
    ///
    /// The new attempt replaces any cached one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when the source yields nothing,
    /// `SessionError::Source` when the fetch fails, and `SessionError::Storage`
    /// when the cache cannot be written.
    pub async fn start_session<R: Rng + ?Sized>(
        &self,
        user: &UserSession,
        selection: QuizSelection,
        rng: &mut R,
    ) -> Result<QuizSession, SessionError> {
        let request = QuestionRequest::for_selection(&selection, self.settings.question_count());
        let mut questions = self.source.fetch(&request).await.map_err(|e| {
            warn!(error = %e, topic = %request.topic, "question fetch failed");
            e
        })?;

        let limit = usize::try_from(self.settings.question_count()).unwrap_or(usize::MAX);
        questions.truncate(limit);

        let engine = QuizSessionEngine::start_shuffled(questions, &self.settings, rng).map_err(
            |e| match e {
                EngineError::EmptyQuestionSet => SessionError::NoQuestions,
                other => SessionError::Engine(other),
            },
        )?;

        let session = QuizSession::new(
            user.username.clone(),
            selection,
            self.clock.now(),
            engine,
        );
        self.cache.save_current(&session.to_cached()).await?;

        info!(
            user = %session.owner(),
            subject = %session.selection().subject,
            topic = %session.selection().topic,
            questions = session.engine().state().questions().len(),
            "quiz session started"
        );
        Ok(session)
    }

    /// Pick up the cached attempt for `user`, if there is one.
    ///
    /// Cached attempts belonging to someone else are left alone. Finished or
    /// unreadable snapshots are discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on cache failures.
    pub async fn resume_session(
        &self,
        user: &UserSession,
    ) -> Result<Option<QuizSession>, SessionError> {
        let cached = match self.cache.load_current().await {
            Ok(Some(cached)) => cached,
            Ok(None) => return Ok(None),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "discarding undecodable cached session");
                self.cache.clear_current().await?;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if cached.username != user.username {
            debug!(user = %user.username, "cached session belongs to another user");
            return Ok(None);
        }
        if cached.state.is_finished() {
            self.cache.clear_current().await?;
            return Ok(None);
        }

        match QuizSessionEngine::resume(cached.state, &self.settings) {
            Ok(engine) => {
                info!(user = %cached.username, "quiz session resumed");
                Ok(Some(QuizSession::new(
                    cached.username,
                    cached.selection,
                    cached.started_at,
                    engine,
                )))
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable cached session");
                self.cache.clear_current().await?;
                Ok(None)
            }
        }
    }

    /// Advance the countdown by one second.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the cache or history cannot be written.
    pub async fn tick(&self, session: &mut QuizSession) -> Result<SessionStep, SessionError> {
        if !session.engine().timer_running() {
            return Ok(session.step(false));
        }

        let before = session.engine().state().active_index();
        let state = session.engine_mut().tick();
        let timed_out = state.is_finished() || state.active_index() != before;
        if timed_out {
            debug!(question = before, "question timed out");
        }

        self.persist(session).await?;
        Ok(session.step(timed_out))
    }

    /// Record the chosen option for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Engine` for invalid or repeated selections and
    /// `SessionError::Storage` when the cache cannot be written.
    pub async fn answer(
        &self,
        session: &mut QuizSession,
        option_index: usize,
    ) -> Result<SessionStep, SessionError> {
        session.engine_mut().select_answer(option_index)?;
        self.persist(session).await?;
        Ok(session.step(false))
    }

    /// Move to the next question, finishing after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Engine` once finished and storage errors otherwise.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<SessionStep, SessionError> {
        session.engine_mut().advance()?;
        self.persist(session).await?;
        Ok(session.step(false))
    }

    /// Tear down an attempt without recording it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the cache cannot be cleared.
    pub async fn abandon(&self, session: &QuizSession) -> Result<(), SessionError> {
        info!(user = %session.owner(), "quiz session abandoned");
        self.cache.clear_current().await?;
        Ok(())
    }

    async fn persist(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        let Some(tally) = session.tally() else {
            self.cache.save_current(&session.to_cached()).await?;
            return Ok(());
        };
        if session.history_id().is_some() {
            return Ok(());
        }

        let entry = HistoryEntry::from_tally(
            session.owner().clone(),
            session.selection(),
            &tally,
            self.clock.now(),
        )?;
        let id = self.history.append_entry(&entry).await?;
        session.set_history_id(id);
        self.cache.clear_current().await?;

        info!(
            user = %session.owner(),
            correct = tally.correct,
            wrong = tally.wrong,
            seconds = tally.total_seconds_used,
            history_id = %id,
            "quiz session finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_service::AuthService;
    use crate::question_source::StaticQuestionSource;
    use quiz_core::model::{Difficulty, Question};
    use quiz_core::time::fixed_clock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::InMemoryRepository;

    fn question(text: &str, options: &[&str], correct: &str) -> Question {
        Question::new(
            text,
            options.iter().map(|o| (*o).to_string()).collect(),
            correct,
        )
        .unwrap()
    }

    fn selection() -> QuizSelection {
        QuizSelection {
            subject: "Mathematics".into(),
            topic: "Algebra".into(),
            difficulty: Difficulty::Easy,
        }
    }

    fn service(questions: Vec<Question>, repo: &InMemoryRepository) -> QuizLoopService {
        QuizLoopService::new(
            fixed_clock(),
            Arc::new(StaticQuestionSource::new(questions)),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn empty_source_refuses_to_start() {
        let repo = InMemoryRepository::new();
        let svc = service(Vec::new(), &repo);
        let user = AuthService::new().login("ada").unwrap();

        let err = svc
            .start_session(&user, selection(), &mut StdRng::seed_from_u64(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoQuestions));
        assert!(repo.load_current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn question_count_limits_the_session() {
        let repo = InMemoryRepository::new();
        let qs = (0..5)
            .map(|i| question(&format!("Q{i}"), &["a", "b"], "a"))
            .collect();
        let svc = service(qs, &repo).with_settings(SessionSettings::new(60, 3).unwrap());
        let user = AuthService::new().login("ada").unwrap();

        let session = svc
            .start_session(&user, selection(), &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        assert_eq!(session.engine().state().questions().len(), 3);
    }

    #[tokio::test]
    async fn every_mutation_refreshes_the_cache() {
        let repo = InMemoryRepository::new();
        let svc = service(
            vec![
                question("2+2?", &["3", "4", "5"], "4"),
                question("3+3?", &["6", "7"], "6"),
            ],
            &repo,
        );
        let user = AuthService::new().login("ada").unwrap();
        let mut session = svc
            .start_session(&user, selection(), &mut StdRng::seed_from_u64(9))
            .await
            .unwrap();

        svc.tick(&mut session).await.unwrap();
        let cached = repo.load_current().await.unwrap().unwrap();
        assert_eq!(cached.state.elapsed_seconds(), 1);

        let idx = session.engine().current_question().unwrap().correct_index();
        svc.answer(&mut session, idx).await.unwrap();
        let cached = repo.load_current().await.unwrap().unwrap();
        assert_eq!(cached.state.correct_count(), 1);
        assert_eq!(cached.state.total_seconds_used(), 1);
    }

    #[tokio::test]
    async fn resume_ignores_other_users() {
        let repo = InMemoryRepository::new();
        let svc = service(vec![question("2+2?", &["3", "4"], "4")], &repo);
        let auth = AuthService::new();
        let ada = auth.login("ada").unwrap();
        let bob = auth.login("bob").unwrap();

        svc.start_session(&ada, selection(), &mut StdRng::seed_from_u64(2))
            .await
            .unwrap();

        assert!(svc.resume_session(&bob).await.unwrap().is_none());
        let resumed = svc.resume_session(&ada).await.unwrap().unwrap();
        assert_eq!(resumed.owner().as_str(), "ada");
        assert!(!resumed.is_complete());
    }

    #[tokio::test]
    async fn timeout_step_is_flagged() {
        let repo = InMemoryRepository::new();
        let svc = service(
            vec![question("a", &["x", "y"], "x"), question("b", &["x", "y"], "y")],
            &repo,
        )
        .with_settings(SessionSettings::new(2, 15).unwrap());
        let user = AuthService::new().login("ada").unwrap();
        let mut session = svc
            .start_session(&user, selection(), &mut StdRng::seed_from_u64(4))
            .await
            .unwrap();

        assert!(!svc.tick(&mut session).await.unwrap().timed_out);
        assert!(!svc.tick(&mut session).await.unwrap().timed_out);
        let step = svc.tick(&mut session).await.unwrap();
        assert!(step.timed_out);
        assert_eq!(step.state.active_index(), 1);
        assert_eq!(step.state.wrong_count(), 1);
    }
}
