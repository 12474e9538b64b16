use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Difficulty, Question, QuestionRecord, QuizSelection};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QuestionSourceError;

/// Request body understood by the question generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub num_questions: u32,
}

impl QuestionRequest {
    #[must_use]
    pub fn for_selection(selection: &QuizSelection, num_questions: u32) -> Self {
        Self {
            topic: selection.generator_topic(),
            difficulty: selection.difficulty,
            num_questions,
        }
    }
}

/// Supplies the ordered question list for one quiz attempt.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch questions for the request. An empty list means nothing is available.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` if the source cannot be reached or answers garbage.
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, QuestionSourceError>;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct QuestionSourceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl QuestionSourceConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8000";

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/quiz/generate", self.base_url.trim_end_matches('/'))
    }
}

/// Question source backed by the remote quiz generator.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    config: QuestionSourceConfig,
}

impl HttpQuestionSource {
    /// Build a source for the given generator endpoint.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::Http` if the HTTP client cannot be built.
    pub fn new(config: QuestionSourceConfig) -> Result<Self, QuestionSourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &QuestionSourceConfig {
        &self.config
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, QuestionSourceError> {
        let url = self.config.generate_url();
        debug!(%url, topic = %request.topic, "requesting questions");

        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(QuestionSourceError::HttpStatus(response.status()));
        }

        let body: Value = response.json().await?;
        parse_questions(body)
    }
}

/// Decode a generator payload into validated questions.
///
/// A bare object is treated as a one-question list. Items that fail validation
/// are skipped.
pub(crate) fn parse_questions(body: Value) -> Result<Vec<Question>, QuestionSourceError> {
    let items = match body {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        Value::Null => Vec::new(),
        other => {
            return Err(QuestionSourceError::InvalidPayload(format!(
                "expected array or object, got {other}"
            )));
        }
    };

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record = match serde_json::from_value::<QuestionRecord>(item) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, error = %err, "dropping malformed question");
                continue;
            }
        };
        match Question::try_from(record) {
            Ok(question) => questions.push(question),
            Err(err) => warn!(index, error = %err, "dropping invalid question"),
        }
    }
    Ok(questions)
}

//
// ─── STATIC ────────────────────────────────────────────────────────────────────
//

/// Fixed in-memory question list, ignoring the request.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    questions: Vec<Question>,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn fetch(&self, _request: &QuestionRequest) -> Result<Vec<Question>, QuestionSourceError> {
        Ok(self.questions.clone())
    }
}
