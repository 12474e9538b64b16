use std::sync::Arc;

use quiz_core::model::SessionSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::question_source::{HttpQuestionSource, QuestionSource, QuestionSourceConfig};
use crate::sessions::{HistoryService, QuizLoopService};

/// Assembles the services a host needs from one storage backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    quiz_loop: Arc<QuizLoopService>,
    history: Arc<HistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP question generator.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        source_config: QuestionSourceConfig,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(HttpQuestionSource::new(source_config)?);
        Ok(Self::from_parts(&storage, clock, source, settings))
    }

    /// Build services from already constructed parts.
    #[must_use]
    pub fn from_parts(
        storage: &Storage,
        clock: Clock,
        source: Arc<dyn QuestionSource>,
        settings: SessionSettings,
    ) -> Self {
        let quiz_loop = QuizLoopService::new(
            clock,
            source,
            Arc::clone(&storage.history),
            Arc::clone(&storage.session_cache),
        )
        .with_settings(settings);

        Self {
            auth: Arc::new(AuthService::new()),
            quiz_loop: Arc::new(quiz_loop),
            history: Arc::new(HistoryService::new(Arc::clone(&storage.history))),
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }
}
