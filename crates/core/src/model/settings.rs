use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("time limit per question must be > 0")]
    InvalidTimeLimit,

    #[error("question count must be between 1 and {max}")]
    InvalidQuestionCount { max: u32 },
}

/// Timing and sizing rules applied to every quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    time_limit_secs: u32,
    question_count: u32,
}

impl SessionSettings {
    pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
    pub const DEFAULT_QUESTION_COUNT: u32 = 15;
    pub const MAX_QUESTION_COUNT: u32 = 50;

    /// Creates custom session settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the time limit is zero or the question count is
    /// outside `1..=MAX_QUESTION_COUNT`.
    pub fn new(time_limit_secs: u32, question_count: u32) -> Result<Self, SettingsError> {
        if time_limit_secs == 0 {
            return Err(SettingsError::InvalidTimeLimit);
        }
        if question_count == 0 || question_count > Self::MAX_QUESTION_COUNT {
            return Err(SettingsError::InvalidQuestionCount {
                max: Self::MAX_QUESTION_COUNT,
            });
        }
        Ok(Self {
            time_limit_secs,
            question_count,
        })
    }

    /// Seconds a question may stay unanswered before it times out.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    /// Number of questions requested from the question source.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: Self::DEFAULT_TIME_LIMIT_SECS,
            question_count: Self::DEFAULT_QUESTION_COUNT,
        }
    }
}
